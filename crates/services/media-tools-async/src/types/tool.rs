//! Response types shared by every processing endpoint

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::shape;
use crate::config::join_url;

/// Body returned by a processing endpoint
///
/// Endpoints disagree on where the output lives; [`ToolResponse::locator`]
/// resolves it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Free-form status string (`"ok"`, `"queued"`, ...)
    #[serde(
        default,
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    /// Output URL, or a path relative to the API base
    #[serde(
        default,
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub result_path: Option<String>,
    /// Public object-storage URL
    #[serde(
        default,
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub gcs_url: Option<String>,
    /// Object-storage URI
    #[serde(
        default,
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub gcs_uri: Option<String>,
    /// Result path relative to the API base
    #[serde(
        default,
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_result_url: Option<String>,
    /// Output filename
    #[serde(
        default,
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub filename: Option<String>,
    /// Informational or error message
    #[serde(
        default,
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    /// Job to poll when the work continues server-side; numeric ids are kept
    /// in their decimal form
    #[serde(
        default,
        alias = "jobId",
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_id: Option<String>,
    /// Everything else (segments, transcripts, diagnostics)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where a processed output can be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultLocator {
    /// Absolute URL
    Url(String),
    /// Object-storage locator, used as-is
    Storage(String),
    /// Path under the API base
    ApiPath(String),
}

impl ResultLocator {
    /// Link a user can open, joining API paths onto `api_base`
    #[must_use]
    pub fn href(&self, api_base: &str) -> String {
        match self {
            Self::Url(u) | Self::Storage(u) => u.clone(),
            Self::ApiPath(p) => join_url(api_base, p),
        }
    }
}

fn non_empty(v: Option<&String>) -> Option<&str> {
    v.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn is_absolute(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl ToolResponse {
    /// Resolves the output location, first present wins:
    /// `gcs_url`, `gcs_uri`, `result_path`, `api_result_url`.
    ///
    /// A `result_path` that is not an absolute URL is treated as an API path.
    #[must_use]
    pub fn locator(&self) -> Option<ResultLocator> {
        if let Some(u) = non_empty(self.gcs_url.as_ref()) {
            return Some(ResultLocator::Storage(u.into()));
        }
        if let Some(u) = non_empty(self.gcs_uri.as_ref()) {
            return Some(ResultLocator::Storage(u.into()));
        }
        if let Some(p) = non_empty(self.result_path.as_ref()) {
            return Some(if is_absolute(p) {
                ResultLocator::Url(p.into())
            } else {
                ResultLocator::ApiPath(p.into())
            });
        }
        non_empty(self.api_result_url.as_ref()).map(|p| ResultLocator::ApiPath(p.into()))
    }

    /// Job id to hand to the poller, if the work continues server-side
    #[must_use]
    pub fn job_id(&self) -> Option<&str> {
        non_empty(self.job_id.as_ref())
    }
}

/// What a tool page shows after a submission: a link plus the raw JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    /// Resolved output link
    pub link: Option<String>,
    /// Filename to label the link with
    pub filename: String,
    /// Server message, if any
    pub message: Option<String>,
    /// Pretty-printed response body
    pub raw_json: String,
}

impl ResultView {
    /// Builds the view for `resp`, labelling the link with the response filename
    /// or `default_filename`.
    #[must_use]
    pub fn new(resp: &ToolResponse, api_base: &str, default_filename: &str) -> Self {
        Self {
            link: resp.locator().map(|l| l.href(api_base)),
            filename: non_empty(resp.filename.as_ref())
                .unwrap_or(default_filename)
                .to_string(),
            message: non_empty(resp.message.as_ref()).map(str::to_string),
            raw_json: serde_json::to_string_pretty(resp).unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for ResultView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.link {
            Some(link) => write!(f, "Open result ({}): {link}", self.filename),
            None => f.write_str("No result_path returned."),
        }
    }
}
