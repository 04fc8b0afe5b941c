/// Notification endpoints
///
/// # Endpoints
///
/// - `GET /v1/notifications` - The caller's unread notifications
/// - `PUT /v1/notifications/read` - Mark one (`?id=`) or all notifications read

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use taskdeck_shared::{models::Notification, policy::Principal};
use uuid::Uuid;

/// Unread notifications, newest first
pub async fn list_unread(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = Notification::list_unread(&state.db, principal.user_id).await?;
    Ok(Json(notifications))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadQuery {
    /// Specific notification to mark; omit to mark all
    pub id: Option<Uuid>,
}

/// Mark notifications read; repeat calls are no-ops
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<MarkReadQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    match query.id {
        Some(id) => {
            Notification::mark_read(&state.db, id, principal.user_id).await?;
        }
        None => {
            Notification::mark_all_read(&state.db, principal.user_id).await?;
        }
    }

    Ok(Json(serde_json::json!({ "message": "Done" })))
}
