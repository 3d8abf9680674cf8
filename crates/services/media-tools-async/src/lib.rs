#![deny(clippy::all)]
#![deny(missing_docs)]

//! Async client for the Media Tools processing API: session handling, per-tool
//! multipart uploads, and background job polling, with wiremock tests.

/// HTTP client implementation
pub mod client;
/// Configuration types for the client
pub mod config;
/// Error types
pub mod error;
/// Job status polling
pub mod poller;
/// API resource implementations
pub mod resources;
/// Session state and signed session values
pub mod session;
/// Test support utilities (for use in tests)
#[doc(hidden)]
pub mod test_support;
/// Tool catalog and request builder
pub mod tools;
/// Request and response types
pub mod types;

pub use crate::client::Client;
pub use crate::config::{Config, MediaToolsConfig};
pub use crate::error::{ApiErrorObject, MediaToolsError};
pub use crate::poller::{JobPoller, PollEvent, PollOptions, PollerState};
pub use crate::session::{Session, SessionHandle, SessionState};
pub use crate::tools::{ToolRequest, ToolSpec};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::poller::{JobPoller, PollEvent, PollOptions, PollerState};
    pub use crate::resources::ToolOutcome;
    pub use crate::tools::{ToolCategory, ToolRequest, ToolSpec, ToolStatus};
    pub use crate::types::*;
    pub use crate::{Client, MediaToolsConfig, MediaToolsError, SessionHandle};
}
