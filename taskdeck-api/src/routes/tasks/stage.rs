/// Stage changes and the activity timeline
///
/// # Endpoints
///
/// - `PUT  /v1/tasks/:id/stage` - Move a task to a new stage
/// - `POST /v1/tasks/:id/activity` - Post a timeline entry (moves the stage too)
///
/// Both are open to assignees as well as managers and admins; being
/// assigned to a task is what grants the right to report progress on it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use taskdeck_shared::{
    models::{Activity, Task, TaskStage, UpdateTask},
    policy::{Principal, TaskAction},
};
use uuid::Uuid;
use validator::Validate;

use super::load_authorized;

#[derive(Debug, Deserialize)]
pub struct ChangeStageRequest {
    pub stage: TaskStage,
}

/// Move a task to a new stage
pub async fn change_stage(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeStageRequest>,
) -> ApiResult<Json<Task>> {
    load_authorized(&state, &principal, id, TaskAction::ChangeStage).await?;

    let updated = Task::update(
        &state.db,
        id,
        UpdateTask {
            stage: Some(req.stage),
            ..UpdateTask::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostActivityRequest {
    /// Event type, drawn from the stage vocabulary
    #[serde(rename = "type")]
    pub kind: TaskStage,

    #[validate(length(min = 1, max = 2000, message = "Activity text is required"))]
    pub activity: String,
}

/// Post a timeline entry
///
/// The task's stage follows the entry's type in the same statement, so the
/// timeline and the stage cannot disagree.
pub async fn post_activity(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<PostActivityRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    load_authorized(&state, &principal, id, TaskAction::PostActivity).await?;

    let entry = Activity {
        kind: req.kind,
        activity: req.activity,
        date: Utc::now(),
        by: Some(principal.user_id),
    };

    let updated = Task::push_activity(&state.db, id, &entry)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(updated))
}
