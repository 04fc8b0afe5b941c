/// Task model and database operations
///
/// Tasks carry their own assignment list (`team`, an array of user ids),
/// an owning manager, and the department the owner managed at creation
/// time (`team_department`). The activity timeline and sub-task checklist
/// are stored as JSONB arrays and only ever appended to.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     priority task_priority NOT NULL DEFAULT 'normal',
///     stage task_stage NOT NULL DEFAULT 'todo',
///     activities JSONB NOT NULL DEFAULT '[]',
///     sub_tasks JSONB NOT NULL DEFAULT '[]',
///     assets TEXT[] NOT NULL DEFAULT '{}',
///     team UUID[] NOT NULL DEFAULT '{}',
///     manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     team_department team,
///     is_trashed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tasks_department_with_owner
///         CHECK (manager_id IS NULL OR team_department IS NOT NULL)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::org::Team;
use crate::policy::evaluator::TaskScope;

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    Medium,
    Normal,
    Low,
}

impl TaskPriority {
    /// Converts priority to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Normal => "normal",
            TaskPriority::Low => "low",
        }
    }
}

/// Task lifecycle stage
///
/// `stage` doubles as the activity event type, so the set is wider than a
/// strict lifecycle: `started`, `assigned`, and `bug` appear mostly on the
/// timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStage {
    Todo,
    #[sqlx(rename = "in progress")]
    #[serde(rename = "in progress")]
    InProgress,
    Completed,
    Started,
    Assigned,
    Bug,
}

impl TaskStage {
    /// Converts stage to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStage::Todo => "todo",
            TaskStage::InProgress => "in progress",
            TaskStage::Completed => "completed",
            TaskStage::Started => "started",
            TaskStage::Assigned => "assigned",
            TaskStage::Bug => "bug",
        }
    }
}

/// One entry in a task's append-only activity timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Event type, drawn from the stage vocabulary
    #[serde(rename = "type")]
    pub kind: TaskStage,

    /// Free-text description of what happened
    pub activity: String,

    /// When the event occurred
    pub date: DateTime<Utc>,

    /// User who performed the action, when known
    pub by: Option<Uuid>,
}

/// A checklist item attached to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    pub title: String,
    pub date: DateTime<Utc>,
    pub tag: String,
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Due/reference date
    pub date: DateTime<Utc>,

    pub priority: TaskPriority,

    pub stage: TaskStage,

    /// Append-only activity timeline
    pub activities: Json<Vec<Activity>>,

    /// Checklist items
    pub sub_tasks: Json<Vec<SubTask>>,

    /// Attached asset URLs
    pub assets: Vec<String>,

    /// Assigned user ids
    pub team: Vec<Uuid>,

    /// Owning manager; None for admin-created tasks
    pub manager_id: Option<Uuid>,

    /// Department of the owning manager at creation time
    pub team_department: Option<Team>,

    /// Soft-delete flag; trashed tasks are hidden from normal listings
    pub is_trashed: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub date: DateTime<Utc>,
    pub priority: TaskPriority,
    pub stage: TaskStage,
    pub assets: Vec<String>,
    pub team: Vec<Uuid>,
    pub manager_id: Option<Uuid>,
    pub team_department: Option<Team>,
    /// Checklist carried over on duplication; empty for new tasks
    pub sub_tasks: Vec<SubTask>,
    /// Seed timeline entry recorded at creation
    pub initial_activity: Activity,
}

/// Input for updating a task; only non-None fields are touched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub priority: Option<TaskPriority>,
    pub stage: Option<TaskStage>,
    pub assets: Option<Vec<String>>,
    pub team: Option<Vec<Uuid>>,
}

/// Listing filters applied inside a task scope
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub stage: Option<TaskStage>,
    pub trashed: bool,
    pub search: Option<String>,
}

const TASK_COLUMNS: &str = "id, title, date, priority, stage, activities, sub_tasks, assets, \
                            team, manager_id, team_department, is_trashed, created_at, updated_at";

/// Appends a scope predicate to a query, returning the next bind index.
///
/// The scope always applies before any filter; a request can never widen
/// its visibility past what the scope grants.
fn push_scope_clause(query: &mut String, scope: &TaskScope, mut bind_count: usize) -> usize {
    match scope {
        TaskScope::All { manager_id } => {
            if manager_id.is_some() {
                bind_count += 1;
                query.push_str(&format!(" AND manager_id = ${}", bind_count));
            }
        }
        TaskScope::OwnedBy(_) => {
            bind_count += 1;
            query.push_str(&format!(" AND manager_id = ${}", bind_count));
        }
        TaskScope::AssignedTo(_) => {
            bind_count += 1;
            query.push_str(&format!(" AND team @> ARRAY[${}]::uuid[]", bind_count));
        }
    }
    bind_count
}

impl Task {
    /// Creates a task with a seed activity on its timeline
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, date, priority, stage, activities, sub_tasks, assets,
                               team, manager_id, team_department)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.date)
        .bind(data.priority)
        .bind(data.stage)
        .bind(Json(vec![data.initial_activity]))
        .bind(Json(data.sub_tasks))
        .bind(data.assets)
        .bind(data.team)
        .bind(data.manager_id)
        .bind(data.team_department)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, trashed or not
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists tasks visible within a scope, with optional filters
    ///
    /// Search matches title, stage, or priority, case-insensitively.
    /// Trashed tasks are excluded unless `filter.trashed` asks for them.
    pub async fn list(
        pool: &PgPool,
        scope: &TaskScope,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE is_trashed = $1");
        let mut bind_count = push_scope_clause(&mut query, scope, 1);

        if filter.stage.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND stage = ${}", bind_count));
        }
        if filter.search.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND (title ILIKE ${n} OR stage::text ILIKE ${n} OR priority::text ILIKE ${n})",
                n = bind_count
            ));
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, Task>(&query).bind(filter.trashed);
        match scope {
            TaskScope::All { manager_id: Some(manager_id) } => q = q.bind(*manager_id),
            TaskScope::All { manager_id: None } => {}
            TaskScope::OwnedBy(id) | TaskScope::AssignedTo(id) => q = q.bind(*id),
        }
        if let Some(stage) = filter.stage {
            q = q.bind(stage);
        }
        if let Some(search) = &filter.search {
            q = q.bind(format!("%{}%", search));
        }

        q.fetch_all(pool).await
    }

    /// Updates task fields; only non-None fields are touched
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", date = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.stage.is_some() {
            bind_count += 1;
            query.push_str(&format!(", stage = ${}", bind_count));
        }
        if data.assets.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assets = ${}", bind_count));
        }
        if data.team.is_some() {
            bind_count += 1;
            query.push_str(&format!(", team = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(date) = data.date {
            q = q.bind(date);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(stage) = data.stage {
            q = q.bind(stage);
        }
        if let Some(assets) = data.assets {
            q = q.bind(assets);
        }
        if let Some(team) = data.team {
            q = q.bind(team);
        }

        q.fetch_optional(pool).await
    }

    /// Appends an activity entry and moves the task to the entry's stage
    ///
    /// A single statement, so the stage change and the timeline entry can
    /// never be observed apart.
    pub async fn push_activity(
        pool: &PgPool,
        id: Uuid,
        entry: &Activity,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET stage = $2,
                activities = activities || $3::jsonb,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(entry.kind)
        .bind(Json(entry))
        .fetch_optional(pool)
        .await
    }

    /// Appends a checklist item
    pub async fn push_subtask(
        pool: &PgPool,
        id: Uuid,
        sub_task: &SubTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET sub_tasks = sub_tasks || $2::jsonb,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(Json(sub_task))
        .fetch_optional(pool)
        .await
    }

    /// Moves a task into or out of the trash
    pub async fn set_trashed(pool: &PgPool, id: Uuid, trashed: bool) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE tasks SET is_trashed = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(trashed)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes a single task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes all trashed tasks within a scope
    ///
    /// One statement; a task trashed concurrently with the request is
    /// either fully included or fully excluded.
    pub async fn delete_trashed(pool: &PgPool, scope: &TaskScope) -> Result<u64, sqlx::Error> {
        let mut query = String::from("DELETE FROM tasks WHERE is_trashed");
        push_scope_clause(&mut query, scope, 0);

        let mut q = sqlx::query(&query);
        match scope {
            TaskScope::All { manager_id: Some(manager_id) } => q = q.bind(*manager_id),
            TaskScope::All { manager_id: None } => {}
            TaskScope::OwnedBy(id) | TaskScope::AssignedTo(id) => q = q.bind(*id),
        }

        let result = q.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Restores all trashed tasks within a scope
    pub async fn restore_trashed(pool: &PgPool, scope: &TaskScope) -> Result<u64, sqlx::Error> {
        let mut query =
            String::from("UPDATE tasks SET is_trashed = FALSE, updated_at = NOW() WHERE is_trashed");
        push_scope_clause(&mut query, scope, 0);

        let mut q = sqlx::query(&query);
        match scope {
            TaskScope::All { manager_id: Some(manager_id) } => q = q.bind(*manager_id),
            TaskScope::All { manager_id: None } => {}
            TaskScope::OwnedBy(id) | TaskScope::AssignedTo(id) => q = q.bind(*id),
        }

        let result = q.execute(pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wire_format() {
        assert_eq!(serde_json::to_string(&TaskStage::InProgress).unwrap(), "\"in progress\"");
        assert_eq!(serde_json::to_string(&TaskStage::Todo).unwrap(), "\"todo\"");

        let stage: TaskStage = serde_json::from_str("\"in progress\"").unwrap();
        assert_eq!(stage, TaskStage::InProgress);
    }

    #[test]
    fn test_activity_wire_format() {
        let entry = Activity {
            kind: TaskStage::Completed,
            activity: "Shipped the release".to_string(),
            date: Utc::now(),
            by: Some(Uuid::new_v4()),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "completed");
        assert_eq!(json["activity"], "Shipped the release");
    }

    #[test]
    fn test_scope_clause_binding() {
        // Listing binds is_trashed as $1, so scope clauses start at $2.
        let mut query = String::from("SELECT 1 FROM tasks WHERE is_trashed = $1");
        let n = push_scope_clause(&mut query, &TaskScope::AssignedTo(Uuid::new_v4()), 1);
        assert_eq!(n, 2);
        assert!(query.contains("team @> ARRAY[$2]::uuid[]"));

        let mut query = String::from("SELECT 1 FROM tasks WHERE is_trashed = $1");
        let n = push_scope_clause(&mut query, &TaskScope::All { manager_id: None }, 1);
        assert_eq!(n, 1);
        assert!(!query.contains("manager_id"));

        let mut query = String::from("DELETE FROM tasks WHERE is_trashed");
        let n = push_scope_clause(&mut query, &TaskScope::OwnedBy(Uuid::new_v4()), 0);
        assert_eq!(n, 1);
        assert!(query.contains("manager_id = $1"));
    }

    // Query tests require a running database; see tests/model_query_tests.rs.
}
