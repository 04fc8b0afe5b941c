//! # TaskDeck API Server Library
//!
//! Core functionality for the TaskDeck API server.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder, and auth layers
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Response-shaping middleware
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
