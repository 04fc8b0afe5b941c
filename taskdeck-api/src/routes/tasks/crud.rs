/// Task CRUD endpoints
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create a task (manager/admin)
/// - `GET    /v1/tasks` - Scoped listing with filters
/// - `GET    /v1/tasks/:id` - Fetch one task
/// - `PUT    /v1/tasks/:id` - Update a task (manager/admin)
/// - `POST   /v1/tasks/:id/duplicate` - Duplicate a task (manager/admin)
/// - `PUT    /v1/tasks/:id/subtask` - Add a checklist item (manager/admin)
/// - `DELETE /v1/tasks/:id` - Permanently delete (manager/admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskdeck_shared::{
    models::{
        Activity, CreateTask, Notification, SubTask, Task, TaskFilter, TaskPriority, TaskStage,
        UpdateTask, User,
    },
    org::Team,
    policy::{self, Principal, TaskAction},
};
use uuid::Uuid;
use validator::Validate;

use super::{assignment_notice_text, load_authorized};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    pub date: Option<DateTime<Utc>>,

    #[serde(default = "default_priority")]
    pub priority: TaskPriority,

    #[serde(default = "default_stage")]
    pub stage: TaskStage,

    #[serde(default)]
    pub assets: Vec<String>,

    /// Assigned user ids
    #[serde(default)]
    pub team: Vec<Uuid>,
}

fn default_priority() -> TaskPriority {
    TaskPriority::Normal
}

fn default_stage() -> TaskStage {
    TaskStage::Todo
}

/// Resolves and authorizes a requested assignment list
///
/// Every id must exist, and a non-admin manager may only assign within
/// their own department.
async fn check_assignment(
    state: &AppState,
    principal: &Principal,
    team: &[Uuid],
) -> Result<(), ApiError> {
    if team.is_empty() {
        return Ok(());
    }

    let assignee_teams = User::teams_of(&state.db, team).await?;
    if assignee_teams.len() != team.len() {
        return Err(ApiError::BadRequest(
            "One or more assigned users do not exist".to_string(),
        ));
    }

    policy::authorize_assignment(principal, &assignee_teams)?;
    Ok(())
}

/// Ownership columns for a task created by this principal
///
/// Admin-created tasks carry no owning manager and no department, which
/// keeps them out of every manager's scope.
fn ownership(principal: &Principal) -> Result<(Option<Uuid>, Option<Team>), ApiError> {
    if principal.is_admin {
        return Ok((None, None));
    }
    let team = principal.team.ok_or_else(|| {
        ApiError::BadRequest("You must belong to a team to create tasks".to_string())
    })?;
    Ok((Some(principal.user_id), Some(team)))
}

/// Create a task
///
/// Assignees are notified; the task's timeline starts with an "assigned"
/// entry carrying the same text.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;
    check_assignment(&state, &principal, &req.team).await?;

    let (manager_id, team_department) = ownership(&principal)?;
    let date = req.date.unwrap_or_else(Utc::now);
    let text = assignment_notice_text(req.team.len(), req.priority, date);

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            date,
            priority: req.priority,
            stage: req.stage,
            assets: req.assets,
            team: req.team.clone(),
            manager_id,
            team_department,
            sub_tasks: Vec::new(),
            initial_activity: Activity {
                kind: TaskStage::Assigned,
                activity: text.clone(),
                date: Utc::now(),
                by: Some(principal.user_id),
            },
        },
    )
    .await?;

    if !req.team.is_empty() {
        Notification::create(&state.db, &req.team, &text, Some(task.id)).await?;
    }

    tracing::info!(task_id = %task.id, created_by = %principal.user_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub stage: Option<TaskStage>,

    #[serde(default)]
    pub trashed: bool,

    pub search: Option<String>,

    /// Narrow to one manager's tasks; honored for admins only
    pub manager_id: Option<Uuid>,
}

/// Scoped task listing
///
/// Admin-created tasks have no owning manager, so `manager_id=<admin id>`
/// matches none of them; the filter only finds tasks owned by managers.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let scope = policy::task_scope(&principal, query.manager_id);
    let filter = TaskFilter {
        stage: query.stage,
        trashed: query.trashed,
        search: query.search,
    };

    let tasks = Task::list(&state.db, &scope, &filter).await?;
    Ok(Json(tasks))
}

/// Fetch one task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = load_authorized(&state, &principal, id, TaskAction::Read).await?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: Option<String>,

    pub date: Option<DateTime<Utc>>,
    pub priority: Option<TaskPriority>,
    pub stage: Option<TaskStage>,
    pub assets: Option<Vec<String>>,
    pub team: Option<Vec<Uuid>>,
}

/// Update a task
///
/// Reassignment goes through the same cross-team check as creation.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    load_authorized(&state, &principal, id, TaskAction::Update).await?;

    if let Some(team) = &req.team {
        check_assignment(&state, &principal, team).await?;
    }

    let updated = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            date: req.date,
            priority: req.priority,
            stage: req.stage,
            assets: req.assets,
            team: req.team,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(updated))
}

/// Duplicate a task
///
/// The copy keeps the assignment list, assets, and checklist, takes the
/// caller as its owner, and starts a fresh timeline. Assignees are
/// notified as if it were a new task.
pub async fn duplicate_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let source = load_authorized(&state, &principal, id, TaskAction::Duplicate).await?;

    let (manager_id, team_department) = ownership(&principal)?;
    let text = assignment_notice_text(source.team.len(), source.priority, source.date);

    let task = Task::create(
        &state.db,
        CreateTask {
            title: format!("Duplicate - {}", source.title),
            date: source.date,
            priority: source.priority,
            stage: source.stage,
            assets: source.assets.clone(),
            team: source.team.clone(),
            manager_id,
            team_department,
            sub_tasks: source.sub_tasks.0.clone(),
            initial_activity: Activity {
                kind: TaskStage::Assigned,
                activity: text.clone(),
                date: Utc::now(),
                by: Some(principal.user_id),
            },
        },
    )
    .await?;

    if !task.team.is_empty() {
        Notification::create(&state.db, &task.team, &text, Some(task.id)).await?;
    }

    tracing::info!(task_id = %task.id, source_id = %source.id, "Task duplicated");

    Ok((StatusCode::CREATED, Json(task)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    pub date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tag: String,
}

/// Add a checklist item to a task
pub async fn create_subtask(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateSubTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    load_authorized(&state, &principal, id, TaskAction::CreateSubTask).await?;

    let sub_task = SubTask {
        title: req.title,
        date: req.date.unwrap_or_else(Utc::now),
        tag: req.tag,
    };

    let updated = Task::push_subtask(&state.db, id, &sub_task)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(updated))
}

/// Permanently delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    load_authorized(&state, &principal, id, TaskAction::Delete).await?;

    if !Task::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %id, deleted_by = %principal.user_id, "Task deleted");

    Ok(Json(serde_json::json!({ "message": "Task deleted successfully" })))
}
