/// API route handlers
///
/// - [`health`]: liveness and database connectivity
/// - [`auth`]: register, login, logout, verify
/// - [`users`]: directory, hierarchy, and account management
/// - [`notifications`]: unread listing and read receipts
/// - [`tasks`]: tasks, trash, and the dashboard

pub mod auth;
pub mod health;
pub mod notifications;
pub mod tasks;
pub mod users;
