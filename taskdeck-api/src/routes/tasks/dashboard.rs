/// Dashboard endpoint
///
/// # Endpoint
///
/// ```text
/// GET /v1/tasks/dashboard
/// ```
///
/// Counts are computed over the caller's task scope, the same scope the
/// listing uses, so the dashboard never reveals a task the listing would
/// hide. Trashed tasks are excluded.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use taskdeck_shared::{
    models::{DirectoryUser, Task, TaskFilter, User},
    policy::{self, Principal, UserScope},
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Narrow to one manager's tasks; honored for admins only
    pub manager_id: Option<Uuid>,
}

/// One bar of the priority chart
#[derive(Debug, Serialize)]
pub struct PriorityCount {
    pub name: String,
    pub total: u64,
}

/// Dashboard summary response
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_tasks: usize,

    /// The ten most recent tasks in scope
    pub last_10_tasks: Vec<Task>,

    /// Recently added active users; empty for team-scoped callers
    pub users: Vec<DirectoryUser>,

    /// Task count per stage
    pub stages: BTreeMap<String, u64>,

    /// Task count per priority, chart-shaped
    pub graph_data: Vec<PriorityCount>,
}

/// Scoped dashboard summary
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<DashboardResponse>> {
    let scope = policy::task_scope(&principal, query.manager_id);
    let tasks = Task::list(&state.db, &scope, &TaskFilter::default()).await?;

    let mut stages: BTreeMap<String, u64> = BTreeMap::new();
    let mut priorities: BTreeMap<&'static str, u64> = BTreeMap::new();
    for task in &tasks {
        *stages.entry(task.stage.as_str().to_string()).or_default() += 1;
        *priorities.entry(task.priority.as_str()).or_default() += 1;
    }

    let graph_data = priorities
        .into_iter()
        .map(|(name, total)| PriorityCount {
            name: name.to_string(),
            total,
        })
        .collect();

    // The users panel follows the directory scope; team-scoped callers
    // see an empty panel rather than an error.
    let user_scope = policy::directory_scope(&principal).unwrap_or(UserScope::Empty);
    let users = User::recent_active(&state.db, &user_scope, 10).await?;

    let total_tasks = tasks.len();
    let last_10_tasks = tasks.into_iter().take(10).collect();

    Ok(Json(DashboardResponse {
        total_tasks,
        last_10_tasks,
        users,
        stages,
        graph_data,
    }))
}
