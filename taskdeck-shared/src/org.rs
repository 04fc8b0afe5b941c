/// Organizational enumerations shared across the whole system
///
/// Roles and teams are closed sets. Every validator, model, and the policy
/// evaluator consume these two enums; they are never re-declared per
/// component. The Postgres `user_role` and `team` enum types in the initial
/// migration mirror them exactly.
///
/// # Example
///
/// ```
/// use taskdeck_shared::org::{Role, Team};
///
/// let role: Role = "team_lead".parse().unwrap();
/// assert!(role.requires_team());
/// assert!(role.requires_manager());
/// assert!(!role.is_manager());
///
/// assert_eq!(Team::ALL.len(), 5);
/// assert_eq!(Team::Sales.as_str(), "Sales");
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User role within the organization
///
/// `sub_admin` is the only role that exists outside the team structure.
/// The `is_admin` capability is a separate flag on the user record and is
/// checked independently of the role (an admin bypasses role restrictions
/// even if their role happens to be `manager`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administrative role, not attached to any team
    SubAdmin,

    /// Owns tasks for one department; manages team leads and members
    Manager,

    /// Senior team member; reports to a manager
    TeamLead,

    /// Regular team member; reports to a manager
    TeamMember,
}

impl Role {
    /// Converts role to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SubAdmin => "sub_admin",
            Role::Manager => "manager",
            Role::TeamLead => "team_lead",
            Role::TeamMember => "team_member",
        }
    }

    /// Derived capability: true iff the role is `manager`
    ///
    /// This replaces the legacy stored `isManager` boolean, which could
    /// drift from the role field.
    pub fn is_manager(&self) -> bool {
        matches!(self, Role::Manager)
    }

    /// A team assignment is required for every role except `sub_admin`
    pub fn requires_team(&self) -> bool {
        !matches!(self, Role::SubAdmin)
    }

    /// Team leads and members must report to a manager
    pub fn requires_manager(&self) -> bool {
        matches!(self, Role::TeamLead | Role::TeamMember)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sub_admin" => Ok(Role::SubAdmin),
            "manager" => Ok(Role::Manager),
            "team_lead" => Ok(Role::TeamLead),
            "team_member" => Ok(Role::TeamMember),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Fixed organizational team (department)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team", rename_all = "PascalCase")]
#[serde(rename_all = "PascalCase")]
pub enum Team {
    Development,
    Sales,
    Infrastructure,
    Design,
    Marketing,
}

impl Team {
    /// The complete team enumeration, in display order
    pub const ALL: [Team; 5] = [
        Team::Development,
        Team::Sales,
        Team::Infrastructure,
        Team::Design,
        Team::Marketing,
    ];

    /// Converts team to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Development => "Development",
            Team::Sales => "Sales",
            Team::Infrastructure => "Infrastructure",
            Team::Design => "Design",
            Team::Marketing => "Marketing",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Team {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Development" => Ok(Team::Development),
            "Sales" => Ok(Team::Sales),
            "Infrastructure" => Ok(Team::Infrastructure),
            "Design" => Ok(Team::Design),
            "Marketing" => Ok(Team::Marketing),
            other => Err(format!("unknown team: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_predicates() {
        assert!(Role::Manager.is_manager());
        assert!(!Role::TeamLead.is_manager());
        assert!(!Role::SubAdmin.is_manager());

        assert!(!Role::SubAdmin.requires_team());
        assert!(Role::Manager.requires_team());
        assert!(Role::TeamLead.requires_team());
        assert!(Role::TeamMember.requires_team());

        assert!(!Role::Manager.requires_manager());
        assert!(Role::TeamLead.requires_manager());
        assert!(Role::TeamMember.requires_manager());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::SubAdmin, Role::Manager, Role::TeamLead, Role::TeamMember] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_team_round_trip() {
        for team in Team::ALL {
            assert_eq!(team.as_str().parse::<Team>().unwrap(), team);
        }
        assert!("Finance".parse::<Team>().is_err());
    }

    #[test]
    fn test_serde_wire_format() {
        assert_eq!(serde_json::to_string(&Role::TeamLead).unwrap(), "\"team_lead\"");
        assert_eq!(serde_json::to_string(&Team::Sales).unwrap(), "\"Sales\"");

        let role: Role = serde_json::from_str("\"sub_admin\"").unwrap();
        assert_eq!(role, Role::SubAdmin);
    }
}
