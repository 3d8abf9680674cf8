//! Types for the `/jobs/{id}` endpoint

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::shape;

/// Status of a server-side job
///
/// Parsed case-insensitively. Values the client does not know are kept verbatim
/// and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum JobStatus {
    /// Accepted, not started
    Queued,
    /// In progress
    Running,
    /// Finished successfully
    Done,
    /// Finished with a failure
    Error,
    /// Canceled before finishing
    Canceled,
    /// Any other value reported by the server
    Unknown(String),
}

impl JobStatus {
    /// True for `done`, `error` and `canceled`
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Canceled)
    }

    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
            Self::Canceled => "canceled",
            Self::Unknown(raw) => raw,
        }
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" => Self::Queued,
            "running" => Self::Running,
            "done" => Self::Done,
            "error" => Self::Error,
            "canceled" => Self::Canceled,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<Option<String>> for JobStatus {
    fn from(raw: Option<String>) -> Self {
        raw.map_or_else(Self::default, Self::from)
    }
}

impl From<Value> for JobStatus {
    fn from(raw: Value) -> Self {
        match raw {
            Value::String(s) => Self::from(s),
            Value::Null => Self::default(),
            other => super::shape::scalar_text(&other)
                .map_or_else(|| Self::Unknown(other.to_string()), Self::Unknown),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(raw) if raw.is_empty() => f.write_str("unknown"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Job record returned by `GET /jobs/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    /// Job identifier; numeric ids are kept in their decimal form
    #[serde(default, deserialize_with = "shape::id_text")]
    pub id: String,
    /// Current status
    #[serde(default)]
    pub status: JobStatus,
    /// Progress percentage (0-100) when the server reports one
    ///
    /// Numeric strings are accepted; anything else reads as absent.
    #[serde(
        default,
        deserialize_with = "shape::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress: Option<f64>,
    /// Error or informational message
    #[serde(
        default,
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    /// Output file URL
    #[serde(
        default,
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub result_path: Option<String>,
    /// Output filename
    #[serde(
        default,
        deserialize_with = "shape::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub filename: Option<String>,
    /// Extra server data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Any other fields, kept for the raw view
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobPayload {
    /// Link to the job output, when one has been produced
    #[must_use]
    pub fn result_link(&self) -> Option<&str> {
        self.result_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Pretty-printed JSON of the whole record
    #[must_use]
    pub fn raw_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(JobStatus::from("DONE".to_string()), JobStatus::Done);
        assert_eq!(JobStatus::from(" Running ".to_string()), JobStatus::Running);
        assert_eq!(
            JobStatus::from("paused".to_string()),
            JobStatus::Unknown("paused".into())
        );
    }

    #[test]
    fn terminal_set() {
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Unknown("cancelled".into()).is_terminal());
    }

    #[test]
    fn payload_parses_with_extras() {
        let p: JobPayload = serde_json::from_value(json!({
            "id": "j1",
            "status": "running",
            "progress": 40,
            "worker": "gpu-2"
        }))
        .unwrap();

        assert_eq!(p.id, "j1");
        assert_eq!(p.status, JobStatus::Running);
        assert_eq!(p.progress, Some(40.0));
        assert!(p.result_link().is_none());
        assert_eq!(p.extra.get("worker"), Some(&json!("gpu-2")));
        assert!(p.raw_json().contains("gpu-2"));
    }

    #[test]
    fn missing_status_is_unknown() {
        let p: JobPayload = serde_json::from_value(json!({"id": "j2"})).unwrap();
        assert!(!p.status.is_terminal());
        assert_eq!(p.status.to_string(), "unknown");
    }

    #[test]
    fn null_status_is_unknown() {
        let p: JobPayload = serde_json::from_value(json!({"id": "j3", "status": null})).unwrap();
        assert_eq!(p.status, JobStatus::default());
    }

    #[test]
    fn status_serializes_to_wire_form() {
        let v = serde_json::to_value(JobStatus::Canceled).unwrap();
        assert_eq!(v, json!("canceled"));
    }

    #[test]
    fn numeric_id_and_loose_fields_still_parse() {
        let p: JobPayload = serde_json::from_value(json!({
            "id": 17,
            "status": "done",
            "progress": "100",
            "message": ["not", "text"],
            "result_path": null
        }))
        .unwrap();

        assert_eq!(p.id, "17");
        assert!(p.status.is_terminal());
        assert_eq!(p.progress, Some(100.0));
        assert!(p.message.is_none());
        assert!(p.result_link().is_none());
    }

    #[test]
    fn non_string_status_is_unknown_not_an_error() {
        let p: JobPayload = serde_json::from_value(json!({"id": "j4", "status": 3})).unwrap();
        assert_eq!(p.status, JobStatus::Unknown("3".into()));
        assert!(!p.status.is_terminal());
    }
}
