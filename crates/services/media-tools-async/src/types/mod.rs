//! Request and response types for the Media Tools API

/// Login and registration types
pub mod auth;
/// Health check types
pub mod health;
/// Job status types
pub mod job;
/// Lookup and lenient scalar readers for loosely shaped bodies
pub mod shape;
/// Processing endpoint response types
pub mod tool;

pub use health::ApiHealth;
pub use job::{JobPayload, JobStatus};
pub use tool::{ResultLocator, ResultView, ToolResponse};
