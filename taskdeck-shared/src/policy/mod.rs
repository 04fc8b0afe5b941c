/// Authorization policy
///
/// - [`evaluator`]: pure role-scoped decision functions and visibility scopes
/// - [`hierarchy`]: bounded reports-to chain traversal

pub mod evaluator;
pub mod hierarchy;

pub use evaluator::{
    assignment_candidate_scope, authorize_assign_manager, authorize_assignment,
    authorize_task_action, authorize_team_roster, directory_scope, task_scope, PolicyError,
    Principal, TaskAction, TaskScope, UserScope,
};
pub use hierarchy::{walk_hierarchy, ManagerDirectory, MAX_HIERARCHY_HOPS};
