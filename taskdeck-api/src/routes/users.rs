/// User directory and account endpoints
///
/// # Endpoints
///
/// - `GET    /v1/users/team` - Scoped directory listing with search (manager/admin)
/// - `GET    /v1/users/managers` - Active managers, optional team filter
/// - `GET    /v1/users/teams` - The fixed team enumeration
/// - `GET    /v1/users/assignment-candidates` - Assignable users (manager/admin)
/// - `GET    /v1/users/team-members/:manager_id` - A manager's direct reports
/// - `GET    /v1/users/manager-hierarchy/:manager_id` - Reports-to chain upward
/// - `PUT    /v1/users/assign-manager` - Set a user's manager
/// - `PUT    /v1/users/profile` - Update own (or, as admin, anyone's) profile
/// - `PUT    /v1/users/change-password` - Change own password
/// - `PUT    /v1/users/:id/active` - Activate/deactivate an account (admin)
/// - `DELETE /v1/users/:id` - Delete an account (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use taskdeck_shared::{
    auth::password,
    models::{DirectoryUser, UpdateProfile, User, UserPick},
    org::{Role, Team},
    policy::{self, Principal},
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    /// Matches name, title, email, or role
    pub search: Option<String>,
}

/// Scoped directory listing
///
/// Admins see everyone; managers see their own department. The search
/// filter applies inside that scope.
pub async fn list_team(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<DirectoryQuery>,
) -> ApiResult<Json<Vec<DirectoryUser>>> {
    let scope = policy::directory_scope(&principal)?;
    let users = User::list_directory(&state.db, &scope, query.search.as_deref()).await?;
    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct ManagersQuery {
    pub team: Option<Team>,
}

/// Active managers, optionally narrowed to one team
///
/// Open to any authenticated user; registration needs it to offer a
/// manager selection.
pub async fn list_managers(
    State(state): State<AppState>,
    Query(query): Query<ManagersQuery>,
) -> ApiResult<Json<Vec<UserPick>>> {
    let managers = User::list_managers(&state.db, query.team).await?;
    Ok(Json(managers))
}

/// The fixed team enumeration
pub async fn list_teams() -> Json<Vec<Team>> {
    Json(Team::ALL.to_vec())
}

/// Users the caller may assign tasks to
pub async fn list_assignment_candidates(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<UserPick>>> {
    let scope = policy::assignment_candidate_scope(&principal)?;
    let candidates = User::list_assignment_candidates(&state.db, &scope).await?;
    Ok(Json(candidates))
}

/// A manager's active direct reports
///
/// Visible to admins, the manager themselves, and their reports.
pub async fn list_team_members(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(manager_id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserPick>>> {
    policy::authorize_team_roster(&principal, manager_id)?;
    let members = User::list_direct_reports(&state.db, manager_id).await?;
    Ok(Json(members))
}

/// The reports-to chain from a user upward, starting node included
///
/// The walk is capped at [`policy::MAX_HIERARCHY_HOPS`] nodes in total and
/// is cycle-safe; a corrupt chain returns the portion walked so far rather
/// than an error.
pub async fn manager_hierarchy(
    State(state): State<AppState>,
    Path(manager_id): Path<Uuid>,
) -> ApiResult<Json<Vec<User>>> {
    let start = User::find_by_id(&state.db, manager_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let chain = policy::walk_hierarchy(&state.db, manager_id).await?;

    let mut hierarchy = vec![start];
    for id in chain {
        if hierarchy.len() >= policy::MAX_HIERARCHY_HOPS {
            break;
        }
        // A manager deleted mid-walk simply drops out of the chain.
        if let Some(user) = User::find_by_id(&state.db, id).await? {
            hierarchy.push(user);
        }
    }

    Ok(Json(hierarchy))
}

#[derive(Debug, Deserialize)]
pub struct AssignManagerRequest {
    /// User whose manager is being set
    pub user_id: Uuid,

    /// The manager to assign
    pub manager_id: Uuid,
}

/// Set a user's manager
///
/// Admins may make any assignment. A manager may only assign themselves,
/// and only to users of their own department.
pub async fn assign_manager(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<AssignManagerRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let target = User::find_by_id(&state.db, req.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let new_manager = User::find_by_id(&state.db, req.manager_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Manager not found".to_string()))?;

    if new_manager.role != Role::Manager {
        return Err(ApiError::BadRequest("Invalid manager selection".to_string()));
    }

    policy::authorize_assign_manager(&principal, target.team, req.manager_id)?;

    User::set_manager(&state.db, target.id, new_manager.id).await?;

    tracing::info!(
        user_id = %target.id,
        manager_id = %new_manager.id,
        assigned_by = %principal.user_id,
        "Manager assigned"
    );

    Ok(Json(serde_json::json!({ "message": "Manager assigned successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    /// Target user; admins may edit others, everyone else edits themselves
    pub id: Option<Uuid>,

    pub name: Option<String>,
    pub title: Option<String>,
    pub role: Option<Role>,
    pub team: Option<Team>,
}

/// Update a profile
///
/// Role and team changes are admin-only regardless of target, so a user
/// cannot promote themselves.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ProfileRequest>,
) -> ApiResult<Json<User>> {
    let target_id = match req.id {
        Some(id) if id != principal.user_id => {
            if !principal.is_admin {
                return Err(ApiError::Forbidden(
                    "You can only update your own profile".to_string(),
                ));
            }
            id
        }
        _ => principal.user_id,
    };

    if (req.role.is_some() || req.team.is_some()) && !principal.is_admin {
        return Err(ApiError::Forbidden(
            "Only administrators can change roles or teams".to_string(),
        ));
    }

    let updated = User::update_profile(
        &state.db,
        target_id,
        UpdateProfile {
            name: req.name,
            title: req.title,
            role: req.role,
            team: req.team,
            manager_id: None,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

/// Change the caller's password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    password::validate_password_strength(&req.password)?;
    let password_hash = password::hash_password(&req.password)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if !User::set_password(&state.db, principal.user_id, &password_hash).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Password changed successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Activate or deactivate an account (admin only)
pub async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetActiveRequest>,
) -> ApiResult<Json<User>> {
    let user = User::set_active(&state.db, id, req.is_active)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, is_active = user.is_active, "Account status changed");

    Ok(Json(user))
}

/// Delete an account (admin only)
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, "Account deleted");

    Ok(Json(serde_json::json!({ "message": "User deleted successfully" })))
}
