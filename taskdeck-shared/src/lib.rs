//! # TaskDeck Shared
//!
//! Core domain library for TaskDeck: data models, authentication
//! primitives, the database layer, and the role-scoped authorization
//! policy that every API handler consults.
//!
//! ## Modules
//!
//! - [`org`]: the closed role and team enumerations
//! - [`models`]: users, tasks, and notifications with their SQL
//! - [`auth`]: JWT session tokens and Argon2id password hashing
//! - [`policy`]: pure authorization decisions and visibility scopes
//! - [`db`]: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod org;
pub mod policy;

/// Crate version, from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
