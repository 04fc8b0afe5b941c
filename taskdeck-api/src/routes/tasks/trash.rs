/// Trash endpoints
///
/// # Endpoints
///
/// - `PUT    /v1/tasks/:id/trash` - Move a task to the trash
/// - `PUT    /v1/tasks/:id/restore` - Restore one task
/// - `DELETE /v1/tasks/trashed` - Permanently delete all trashed tasks in scope
/// - `PUT    /v1/tasks/trashed/restore` - Restore all trashed tasks in scope
///
/// The bulk operations run as single scoped statements; a manager's
/// "delete all" can never reach another department's trash.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use taskdeck_shared::{
    models::Task,
    policy::{self, Principal, TaskAction},
};
use uuid::Uuid;

use super::load_authorized;

/// Move a task to the trash
pub async fn trash_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    load_authorized(&state, &principal, id, TaskAction::Trash).await?;
    Task::set_trashed(&state.db, id, true).await?;

    Ok(Json(serde_json::json!({ "message": "Task trashed successfully" })))
}

/// Restore one task from the trash
pub async fn restore_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    load_authorized(&state, &principal, id, TaskAction::Restore).await?;
    Task::set_trashed(&state.db, id, false).await?;

    Ok(Json(serde_json::json!({ "message": "Task restored successfully" })))
}

/// Permanently delete every trashed task the caller can see
pub async fn delete_all_trashed(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<serde_json::Value>> {
    let scope = policy::task_scope(&principal, None);
    let deleted = Task::delete_trashed(&state.db, &scope).await?;

    tracing::info!(count = deleted, deleted_by = %principal.user_id, "Trash emptied");

    Ok(Json(serde_json::json!({
        "message": "Operation performed successfully",
        "deleted": deleted,
    })))
}

/// Restore every trashed task the caller can see
pub async fn restore_all_trashed(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<serde_json::Value>> {
    let scope = policy::task_scope(&principal, None);
    let restored = Task::restore_trashed(&state.db, &scope).await?;

    Ok(Json(serde_json::json!({
        "message": "Operation performed successfully",
        "restored": restored,
    })))
}
