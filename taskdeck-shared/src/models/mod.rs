/// Data models
///
/// Each model owns its table: the struct, its input types, and the SQL that
/// touches it live together.
///
/// - [`user`]: accounts, the manager hierarchy, and directory queries
/// - [`task`]: tasks, the activity timeline, sub-tasks, and the trash
/// - [`notification`]: fan-out notifications with per-recipient read receipts

pub mod notification;
pub mod task;
pub mod user;

pub use notification::Notification;
pub use task::{Activity, CreateTask, SubTask, Task, TaskFilter, TaskPriority, TaskStage, UpdateTask};
pub use user::{CreateUser, DirectoryUser, UpdateProfile, User, UserPick};
