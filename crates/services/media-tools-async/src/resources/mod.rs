//! API resource implementations for the Media Tools client

/// Login, registration and session persistence
pub mod auth;
/// Liveness check
pub mod health;
/// Job status lookups
pub mod jobs;
/// Processing endpoint submissions
pub mod tools;

pub use auth::Auth;
pub use health::Health;
pub use jobs::Jobs;
pub use tools::{ToolOutcome, Tools};
