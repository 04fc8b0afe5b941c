/// Role-scoped authorization for tasks and the user directory
///
/// Every decision is a pure function of a [`Principal`] snapshot and the
/// facts about the resource; nothing in here touches the database. The two
/// halves of the model:
///
/// - **Action checks** answer "may this principal do X to this task/user"
///   and return a typed [`PolicyError`] on denial.
/// - **Scopes** ([`TaskScope`], [`UserScope`]) answer "which rows may this
///   principal see at all" and are translated into SQL predicates by the
///   models. Filters a client supplies are applied inside the scope and can
///   never widen it.
///
/// Admin capability (`is_admin`) bypasses every restriction and is checked
/// before the role, so an admin whose role happens to be `manager` is still
/// unrestricted.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::User;
use crate::org::{Role, Team};

/// Authorization denial, with the user-facing reason
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Manager acting on a task outside their department
    #[error("You can only {action} tasks from your own team")]
    WrongTeam {
        /// Verb phrase for the attempted action, e.g. "update"
        action: &'static str,
    },

    /// Manager assigning a task to someone outside their department
    #[error("You can only assign tasks to members of your own team")]
    CrossTeamAssignment,

    /// Team-scoped user acting on a task they are not assigned to
    #[error("You don't have permission to view this task")]
    NotAssigned,

    /// Non-manager attempting a manager-only operation
    #[error("Access denied: Only managers can perform this action")]
    ManagerOnly,

    /// Manager assigning someone other than themselves as a manager
    #[error("You can only assign yourself as a manager")]
    SelfAssignmentOnly,

    /// Manager assigning a manager to a user outside their department
    #[error("You can only assign managers to users in your team")]
    SameTeamOnly,

    /// Viewing a team roster the principal does not belong to
    #[error("You can only view your own team members")]
    NotYourTeam,
}

/// Snapshot of the authenticated user, taken once per request
///
/// Built from the user row the auth layer loads, so a policy decision and
/// the data fetch that follows see the same facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
    pub team: Option<Team>,
    pub manager_id: Option<Uuid>,
    pub is_admin: bool,
}

impl Principal {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            team: user.team,
            manager_id: user.manager_id,
            is_admin: user.is_admin,
        }
    }

    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }

    /// True for principals allowed to create and manage tasks
    pub fn can_manage_tasks(&self) -> bool {
        self.is_admin || self.is_manager()
    }
}

/// An action on a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Read,
    Update,
    ChangeStage,
    PostActivity,
    Duplicate,
    CreateSubTask,
    Trash,
    Restore,
    Delete,
}

impl TaskAction {
    /// Verb phrase used in denial messages
    pub fn verb(&self) -> &'static str {
        match self {
            TaskAction::Read => "access",
            TaskAction::Update | TaskAction::ChangeStage => "update",
            TaskAction::PostActivity | TaskAction::CreateSubTask => "modify",
            TaskAction::Duplicate => "duplicate",
            TaskAction::Trash => "trash",
            TaskAction::Restore => "restore",
            TaskAction::Delete => "delete",
        }
    }

    /// Actions only managers (and admins) may perform
    ///
    /// Reading, moving the stage, and posting to the timeline are open to
    /// assignees; everything that reshapes or removes the task is not.
    pub fn requires_manager(&self) -> bool {
        !matches!(
            self,
            TaskAction::Read | TaskAction::ChangeStage | TaskAction::PostActivity
        )
    }
}

/// Checks whether a principal may perform an action on a task
///
/// `team_department` is the department of the task's owning manager;
/// `assignees` is the task's assignment list.
///
/// Decision order: admin bypass, then the manager department gate, then the
/// assignee membership gate for team-scoped roles. A manager is confined to
/// tasks of their own department, including tasks with no department at all
/// (admin-created ones).
pub fn authorize_task_action(
    principal: &Principal,
    action: TaskAction,
    team_department: Option<Team>,
    assignees: &[Uuid],
) -> Result<(), PolicyError> {
    if principal.is_admin {
        return Ok(());
    }

    if principal.is_manager() {
        return match (principal.team, team_department) {
            (Some(own), Some(dept)) if own == dept => Ok(()),
            _ => Err(PolicyError::WrongTeam { action: action.verb() }),
        };
    }

    // team_lead, team_member, and non-admin sub_admin
    if action.requires_manager() {
        return Err(PolicyError::ManagerOnly);
    }
    if assignees.contains(&principal.user_id) {
        Ok(())
    } else {
        Err(PolicyError::NotAssigned)
    }
}

/// Checks whether a principal may assign a task to the given users
///
/// `assignee_teams` pairs each requested assignee id with their stored
/// team. A non-admin manager may only assign within their own department;
/// an assignee with no team always fails that check.
pub fn authorize_assignment(
    principal: &Principal,
    assignee_teams: &[(Uuid, Option<Team>)],
) -> Result<(), PolicyError> {
    if principal.is_admin {
        return Ok(());
    }
    if !principal.is_manager() {
        return Err(PolicyError::ManagerOnly);
    }

    let own_team = principal.team.ok_or(PolicyError::CrossTeamAssignment)?;
    for (_, team) in assignee_teams {
        if *team != Some(own_team) {
            return Err(PolicyError::CrossTeamAssignment);
        }
    }
    Ok(())
}

/// Which task rows a principal may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// Everything, optionally narrowed to one manager's tasks
    All { manager_id: Option<Uuid> },

    /// Tasks owned by this manager
    OwnedBy(Uuid),

    /// Tasks whose assignment list contains this user
    AssignedTo(Uuid),
}

/// Computes the task visibility scope for a principal
///
/// Only an admin may use the explicit `requested_manager_id` filter; for
/// everyone else it is ignored, so a crafted query string cannot widen
/// visibility. The same scope backs listings, the trash, and the dashboard,
/// so the dashboard never counts a task its listing would hide.
pub fn task_scope(principal: &Principal, requested_manager_id: Option<Uuid>) -> TaskScope {
    if principal.is_admin {
        TaskScope::All { manager_id: requested_manager_id }
    } else if principal.is_manager() {
        TaskScope::OwnedBy(principal.user_id)
    } else {
        TaskScope::AssignedTo(principal.user_id)
    }
}

/// Which user rows a principal may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserScope {
    /// The whole directory
    All,

    /// Users of one department
    Team(Team),

    /// Nothing
    Empty,
}

/// Computes the directory scope for a principal
///
/// Managers see their own department; a manager with no department sees
/// nothing rather than everything. Non-managers have no directory access.
pub fn directory_scope(principal: &Principal) -> Result<UserScope, PolicyError> {
    if principal.is_admin {
        return Ok(UserScope::All);
    }
    if principal.is_manager() {
        return Ok(match principal.team {
            Some(team) => UserScope::Team(team),
            None => UserScope::Empty,
        });
    }
    Err(PolicyError::ManagerOnly)
}

/// Computes the assignment-candidate scope for a principal
///
/// Same shape as the directory scope; the model additionally restricts a
/// team scope to leads and members.
pub fn assignment_candidate_scope(principal: &Principal) -> Result<UserScope, PolicyError> {
    directory_scope(principal)
}

/// Checks whether a principal may view a manager's direct reports
///
/// Allowed for admins, the manager themselves, and users who report to
/// that manager.
pub fn authorize_team_roster(
    principal: &Principal,
    target_manager_id: Uuid,
) -> Result<(), PolicyError> {
    if principal.is_admin
        || principal.user_id == target_manager_id
        || principal.manager_id == Some(target_manager_id)
    {
        Ok(())
    } else {
        Err(PolicyError::NotYourTeam)
    }
}

/// Checks whether a principal may set `new_manager_id` as the manager of a
/// user on `target_team`
///
/// An admin may make any assignment. A manager may only assign themselves,
/// and only to users of their own department. Everyone else is denied.
pub fn authorize_assign_manager(
    principal: &Principal,
    target_team: Option<Team>,
    new_manager_id: Uuid,
) -> Result<(), PolicyError> {
    if principal.is_admin {
        return Ok(());
    }
    if !principal.is_manager() {
        return Err(PolicyError::ManagerOnly);
    }
    if new_manager_id != principal.user_id {
        return Err(PolicyError::SelfAssignmentOnly);
    }
    if principal.team.is_none() || target_team != principal.team {
        return Err(PolicyError::SameTeamOnly);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            role: Role::SubAdmin,
            team: None,
            manager_id: None,
            is_admin: true,
        }
    }

    fn manager(team: Team) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            role: Role::Manager,
            team: Some(team),
            manager_id: None,
            is_admin: false,
        }
    }

    fn member(team: Team, manager_id: Uuid) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            role: Role::TeamMember,
            team: Some(team),
            manager_id: Some(manager_id),
            is_admin: false,
        }
    }

    #[test]
    fn test_admin_bypasses_everything() {
        let alice = admin();
        for action in [
            TaskAction::Read,
            TaskAction::Update,
            TaskAction::Delete,
            TaskAction::Trash,
        ] {
            assert!(authorize_task_action(&alice, action, Some(Team::Sales), &[]).is_ok());
            assert!(authorize_task_action(&alice, action, None, &[]).is_ok());
        }
        assert!(authorize_assignment(&alice, &[(Uuid::new_v4(), Some(Team::Design))]).is_ok());
        assert_eq!(directory_scope(&alice), Ok(UserScope::All));
    }

    #[test]
    fn test_admin_with_manager_role_is_still_unrestricted() {
        let mut alice = manager(Team::Sales);
        alice.is_admin = true;
        assert!(
            authorize_task_action(&alice, TaskAction::Delete, Some(Team::Development), &[]).is_ok()
        );
    }

    #[test]
    fn test_manager_confined_to_own_department() {
        let bob = manager(Team::Sales);

        assert!(
            authorize_task_action(&bob, TaskAction::Update, Some(Team::Sales), &[]).is_ok()
        );
        assert_eq!(
            authorize_task_action(&bob, TaskAction::Update, Some(Team::Development), &[]),
            Err(PolicyError::WrongTeam { action: "update" })
        );
        // Admin-created tasks have no department; managers cannot touch them.
        assert_eq!(
            authorize_task_action(&bob, TaskAction::Read, None, &[]),
            Err(PolicyError::WrongTeam { action: "access" })
        );
    }

    #[test]
    fn test_wrong_team_message_names_the_action() {
        let bob = manager(Team::Sales);
        let err = authorize_task_action(&bob, TaskAction::Trash, Some(Team::Design), &[])
            .unwrap_err();
        assert_eq!(err.to_string(), "You can only trash tasks from your own team");
    }

    #[test]
    fn test_member_can_act_only_when_assigned() {
        let bob = manager(Team::Sales);
        let carol = member(Team::Sales, bob.user_id);

        let assigned = vec![carol.user_id];
        assert!(
            authorize_task_action(&carol, TaskAction::Read, Some(Team::Sales), &assigned).is_ok()
        );
        assert!(
            authorize_task_action(&carol, TaskAction::ChangeStage, Some(Team::Sales), &assigned)
                .is_ok()
        );
        assert!(
            authorize_task_action(&carol, TaskAction::PostActivity, Some(Team::Sales), &assigned)
                .is_ok()
        );

        // Same team, not assigned: still denied.
        assert_eq!(
            authorize_task_action(&carol, TaskAction::Read, Some(Team::Sales), &[]),
            Err(PolicyError::NotAssigned)
        );
    }

    #[test]
    fn test_member_denied_manager_actions_even_when_assigned() {
        let bob = manager(Team::Sales);
        let carol = member(Team::Sales, bob.user_id);
        let assigned = vec![carol.user_id];

        for action in [
            TaskAction::Update,
            TaskAction::Duplicate,
            TaskAction::CreateSubTask,
            TaskAction::Trash,
            TaskAction::Restore,
            TaskAction::Delete,
        ] {
            assert_eq!(
                authorize_task_action(&carol, action, Some(Team::Sales), &assigned),
                Err(PolicyError::ManagerOnly)
            );
        }
    }

    #[test]
    fn test_non_admin_sub_admin_is_team_scoped() {
        let principal = Principal {
            user_id: Uuid::new_v4(),
            role: Role::SubAdmin,
            team: None,
            manager_id: None,
            is_admin: false,
        };
        assert_eq!(
            authorize_task_action(&principal, TaskAction::Delete, Some(Team::Sales), &[]),
            Err(PolicyError::ManagerOnly)
        );
        assert_eq!(
            task_scope(&principal, None),
            TaskScope::AssignedTo(principal.user_id)
        );
    }

    #[test]
    fn test_cross_team_assignment_denied() {
        let bob = manager(Team::Sales);
        let own = (Uuid::new_v4(), Some(Team::Sales));
        let other = (Uuid::new_v4(), Some(Team::Development));
        let unassigned = (Uuid::new_v4(), None);

        assert!(authorize_assignment(&bob, &[own]).is_ok());
        assert_eq!(
            authorize_assignment(&bob, &[own, other]),
            Err(PolicyError::CrossTeamAssignment)
        );
        assert_eq!(
            authorize_assignment(&bob, &[unassigned]),
            Err(PolicyError::CrossTeamAssignment)
        );
    }

    #[test]
    fn test_assignment_requires_manager() {
        let bob = manager(Team::Sales);
        let carol = member(Team::Sales, bob.user_id);
        assert_eq!(
            authorize_assignment(&carol, &[(Uuid::new_v4(), Some(Team::Sales))]),
            Err(PolicyError::ManagerOnly)
        );
    }

    #[test]
    fn test_task_scope_ignores_filter_for_non_admins() {
        let alice = admin();
        let bob = manager(Team::Sales);
        let carol = member(Team::Sales, bob.user_id);
        let filter = Some(Uuid::new_v4());

        assert_eq!(task_scope(&alice, filter), TaskScope::All { manager_id: filter });
        assert_eq!(task_scope(&bob, filter), TaskScope::OwnedBy(bob.user_id));
        assert_eq!(task_scope(&carol, filter), TaskScope::AssignedTo(carol.user_id));
    }

    #[test]
    fn test_directory_scope() {
        let bob = manager(Team::Sales);
        assert_eq!(directory_scope(&bob), Ok(UserScope::Team(Team::Sales)));

        let mut teamless = manager(Team::Sales);
        teamless.team = None;
        assert_eq!(directory_scope(&teamless), Ok(UserScope::Empty));

        let carol = member(Team::Sales, bob.user_id);
        assert_eq!(directory_scope(&carol), Err(PolicyError::ManagerOnly));
    }

    #[test]
    fn test_team_roster_visibility() {
        let bob = manager(Team::Sales);
        let carol = member(Team::Sales, bob.user_id);
        let dave = member(Team::Development, Uuid::new_v4());

        assert!(authorize_team_roster(&admin(), bob.user_id).is_ok());
        assert!(authorize_team_roster(&bob, bob.user_id).is_ok());
        assert!(authorize_team_roster(&carol, bob.user_id).is_ok());
        assert_eq!(
            authorize_team_roster(&dave, bob.user_id),
            Err(PolicyError::NotYourTeam)
        );
    }

    #[test]
    fn test_department_scenario() {
        // Alice manages Sales; Bob is her report and assigned to her task.
        let alice = manager(Team::Sales);
        let bob = member(Team::Sales, alice.user_id);
        let carol = manager(Team::Design);

        let dept = Some(Team::Sales);
        let assignees = vec![bob.user_id];

        // Alice has full control over her own task.
        assert!(authorize_task_action(&alice, TaskAction::Update, dept, &assignees).is_ok());
        assert!(authorize_task_action(&alice, TaskAction::Trash, dept, &assignees).is_ok());

        // Bob can read it and move its stage, but not trash it.
        assert!(authorize_task_action(&bob, TaskAction::Read, dept, &assignees).is_ok());
        assert!(authorize_task_action(&bob, TaskAction::ChangeStage, dept, &assignees).is_ok());
        assert_eq!(
            authorize_task_action(&bob, TaskAction::Trash, dept, &assignees),
            Err(PolicyError::ManagerOnly)
        );

        // Carol, managing another department, gets nothing.
        assert!(authorize_task_action(&carol, TaskAction::Read, dept, &assignees).is_err());
        assert!(authorize_task_action(&carol, TaskAction::Update, dept, &assignees).is_err());
    }

    #[test]
    fn test_assign_manager_rules() {
        let alice = admin();
        let bob = manager(Team::Sales);
        let eve = manager(Team::Development);
        let carol = member(Team::Sales, bob.user_id);

        // Admin may assign any manager to anyone.
        assert!(authorize_assign_manager(&alice, Some(Team::Design), eve.user_id).is_ok());

        // A manager may assign themselves within their team.
        assert!(authorize_assign_manager(&bob, Some(Team::Sales), bob.user_id).is_ok());

        // But not someone else, even on their own team.
        assert_eq!(
            authorize_assign_manager(&bob, Some(Team::Sales), eve.user_id),
            Err(PolicyError::SelfAssignmentOnly)
        );

        // And not themselves to a user of another team.
        assert_eq!(
            authorize_assign_manager(&bob, Some(Team::Development), bob.user_id),
            Err(PolicyError::SameTeamOnly)
        );

        // Leads and members are denied outright.
        assert_eq!(
            authorize_assign_manager(&carol, Some(Team::Sales), bob.user_id),
            Err(PolicyError::ManagerOnly)
        );
    }
}
