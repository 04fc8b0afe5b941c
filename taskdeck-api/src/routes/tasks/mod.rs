/// Task endpoints
///
/// - [`crud`]: create, list, read, update, duplicate, sub-tasks, delete
/// - [`stage`]: stage changes and the activity timeline
/// - [`trash`]: soft-delete, restore, and bulk trash operations
/// - [`dashboard`]: scoped summary counts
///
/// Every per-task handler goes through [`load_authorized`], so the policy
/// check always runs against the task row the handler then operates on.

pub mod crud;
pub mod dashboard;
pub mod stage;
pub mod trash;

use crate::{app::AppState, error::ApiError};
use chrono::{DateTime, Utc};
use taskdeck_shared::{
    models::{Task, TaskPriority},
    policy::{self, Principal, TaskAction},
};
use uuid::Uuid;

/// Loads a task and authorizes an action on it in one step
///
/// Missing tasks are 404; policy denials carry the evaluator's message.
pub(crate) async fn load_authorized(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    action: TaskAction,
) -> Result<Task, ApiError> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::authorize_task_action(principal, action, task.team_department, &task.team)?;

    Ok(task)
}

/// Builds the assignment notification text
pub(crate) fn assignment_notice_text(
    assignee_count: usize,
    priority: TaskPriority,
    date: DateTime<Utc>,
) -> String {
    let mut text = String::from("New task has been assigned to you");
    if assignee_count > 1 {
        text.push_str(&format!(" and {} others.", assignee_count - 1));
    }
    text.push_str(&format!(
        " The task priority is set a {} priority, so check and act accordingly. \
         The task date is {}. Thank you!!!",
        priority.as_str(),
        date.format("%a %b %e %Y"),
    ));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_notice_text_single_assignee() {
        let date = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        let text = assignment_notice_text(1, TaskPriority::High, date);
        assert!(text.starts_with("New task has been assigned to you The task priority"));
        assert!(text.contains("set a high priority"));
        assert!(text.contains("Mon Sep  1 2025"));
    }

    #[test]
    fn test_notice_text_multiple_assignees() {
        let date = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        let text = assignment_notice_text(3, TaskPriority::Normal, date);
        assert!(text.contains("and 2 others."));
    }
}
