use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SIGN_IN_RETURN_PARAM;

/// Message shown when a call answers 401
pub const MSG_AUTH_REQUIRED: &str = "Authentication required. Please log in to continue.";
/// Message shown when a call answers 403
pub const MSG_FORBIDDEN: &str = "Access denied. You don't have permission to perform this action.";
/// Message shown when login is rejected
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Errors that can occur when using the Media Tools client
#[derive(Debug, Error)]
pub enum MediaToolsError {
    /// Configuration error (missing base URL or API key, invalid request shape)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// No response was received (connect failure, timeout, truncated body)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered 401; the session was dropped and the caller should sign in
    #[error("Authentication required (sign in at {sign_in_route})")]
    AuthRequired {
        /// Route to send the user to
        sign_in_route: String,
    },

    /// The API answered 403 (authorization or quota denied)
    #[error("Forbidden: {}", .0.message)]
    Forbidden(ApiErrorObject),

    /// Any other non-2xx answer
    #[error("API error: {0:?}")]
    Api(ApiErrorObject),

    /// Login was rejected with 401
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A 2xx answer whose body lacks required fields or is not JSON
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A local file could not be read for upload
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A signed session value failed verification
    #[error("Session error: {0}")]
    Session(String),
}

/// Error body returned by the Media Tools API
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorObject {
    /// HTTP status code
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Human-readable error message
    #[serde(default)]
    pub message: String,
    /// Secondary detail field some endpoints use instead of `message`
    #[serde(default)]
    pub detail: Option<String>,
    /// Error type string
    #[serde(default)]
    pub error: Option<String>,
}

impl MediaToolsError {
    /// Returns the inline message a user-facing surface should display
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired { .. } => MSG_AUTH_REQUIRED.into(),
            Self::Forbidden(_) => MSG_FORBIDDEN.into(),
            Self::InvalidCredentials => MSG_INVALID_CREDENTIALS.into(),
            Self::Api(obj) => obj.display_message(),
            Self::Transport(e) => {
                let msg = e.to_string();
                if msg.is_empty() {
                    "Request failed".into()
                } else {
                    msg
                }
            }
            Self::Config(msg) | Self::MalformedResponse(msg) | Self::Session(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
        }
    }

    /// Returns the sign-in route when the caller should redirect the user
    ///
    /// Only [`MediaToolsError::AuthRequired`] redirects; a 403 never does.
    #[must_use]
    pub fn sign_in_redirect(&self) -> Option<&str> {
        match self {
            Self::AuthRequired { sign_in_route } => Some(sign_in_route),
            _ => None,
        }
    }

    /// Like [`MediaToolsError::sign_in_redirect`], carrying `return_to` so the
    /// user lands back on it after signing in.
    ///
    /// `return_to` is percent-encoded into the `callbackUrl` query parameter.
    /// A blank `return_to` gives the bare route.
    #[must_use]
    pub fn sign_in_redirect_to(&self, return_to: &str) -> Option<String> {
        let route = self.sign_in_redirect()?;
        let return_to = return_to.trim();
        if return_to.is_empty() {
            return Some(route.to_string());
        }
        let sep = if route.contains('?') { '&' } else { '?' };
        Some(format!(
            "{route}{sep}{SIGN_IN_RETURN_PARAM}={}",
            urlencoding::encode(return_to)
        ))
    }

    /// HTTP status of the failed call, when one was received
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(obj) | Self::Forbidden(obj) => obj.status_code,
            Self::AuthRequired { .. } | Self::InvalidCredentials => Some(401),
            _ => None,
        }
    }

    /// True when no HTTP response was received
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl ApiErrorObject {
    /// First non-empty of `message`, `detail`, `error`, falling back to `HTTP <status>`
    #[must_use]
    pub fn display_message(&self) -> String {
        [
            Some(self.message.as_str()),
            self.detail.as_deref(),
            self.error.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map_or_else(
            || match self.status_code {
                Some(code) => format!("HTTP {code}"),
                None => "Request failed".into(),
            },
            str::to_string,
        )
    }
}

/// Maps a serde deserialization error to a `MalformedResponse` with context
#[must_use]
pub fn map_deser(e: &serde_json::Error, body: &[u8]) -> MediaToolsError {
    let snippet = String::from_utf8_lossy(&body[..body.len().min(400)]).to_string();
    MediaToolsError::MalformedResponse(format!("{e}: {snippet}"))
}

/// Deserializes an API error from the response body
///
/// Attempts to parse the error as JSON, falling back to plain text on failure.
/// Classifies 403 as [`MediaToolsError::Forbidden`]; 401 handling belongs to the
/// caller because it depends on the session and the configured sign-in route.
#[must_use]
pub fn deserialize_api_error(status: StatusCode, body: &[u8]) -> MediaToolsError {
    let obj = parse_error_object(status, body);
    if status == StatusCode::FORBIDDEN {
        MediaToolsError::Forbidden(obj)
    } else {
        MediaToolsError::Api(obj)
    }
}

fn parse_error_object(status: StatusCode, body: &[u8]) -> ApiErrorObject {
    let status_code = Some(status.as_u16());

    if let Ok(mut obj) = serde_json::from_slice::<ApiErrorObject>(body) {
        obj.status_code = status_code;
        return obj;
    }

    // Server may return plain text or HTML on errors; cap body to avoid log/memory bloat
    ApiErrorObject {
        status_code,
        message: String::from_utf8_lossy(&body[..body.len().min(400)])
            .trim()
            .to_string(),
        detail: None,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_body_parsed() {
        let err = deserialize_api_error(
            StatusCode::BAD_REQUEST,
            br#"{"message":"duration must be positive"}"#,
        );
        match &err {
            MediaToolsError::Api(obj) => {
                assert_eq!(obj.status_code, Some(400));
                assert_eq!(obj.message, "duration must be positive");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
        assert_eq!(err.user_message(), "duration must be positive");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn detail_used_when_message_missing() {
        let err = deserialize_api_error(StatusCode::CONFLICT, br#"{"detail":"email taken"}"#);
        assert_eq!(err.user_message(), "email taken");
    }

    #[test]
    fn plain_text_body_falls_back() {
        let err = deserialize_api_error(StatusCode::BAD_GATEWAY, b"");
        assert_eq!(err.user_message(), "HTTP 502");

        let err = deserialize_api_error(StatusCode::INTERNAL_SERVER_ERROR, b"upstream exploded");
        assert_eq!(err.user_message(), "upstream exploded");
    }

    #[test]
    fn status_only_falls_back_to_http_code() {
        let obj = ApiErrorObject {
            status_code: Some(418),
            ..ApiErrorObject::default()
        };
        assert_eq!(obj.display_message(), "HTTP 418");
    }

    #[test]
    fn forbidden_does_not_redirect() {
        let err = deserialize_api_error(StatusCode::FORBIDDEN, br#"{"message":"quota"}"#);
        assert!(matches!(err, MediaToolsError::Forbidden(_)));
        assert_eq!(err.user_message(), MSG_FORBIDDEN);
        assert!(err.sign_in_redirect().is_none());
    }

    #[test]
    fn auth_required_redirects() {
        let err = MediaToolsError::AuthRequired {
            sign_in_route: "/login".into(),
        };
        assert_eq!(err.sign_in_redirect(), Some("/login"));
        assert_eq!(err.user_message(), MSG_AUTH_REQUIRED);
    }

    #[test]
    fn redirect_keeps_return_route() {
        let err = MediaToolsError::AuthRequired {
            sign_in_route: "/login".into(),
        };
        assert_eq!(
            err.sign_in_redirect_to("/tools/video/trim?x=1").as_deref(),
            Some("/login?callbackUrl=%2Ftools%2Fvideo%2Ftrim%3Fx%3D1")
        );
        assert_eq!(err.sign_in_redirect_to("  ").as_deref(), Some("/login"));

        let err = MediaToolsError::AuthRequired {
            sign_in_route: "/signin?theme=dark".into(),
        };
        assert_eq!(
            err.sign_in_redirect_to("/jobs").as_deref(),
            Some("/signin?theme=dark&callbackUrl=%2Fjobs")
        );

        let forbidden = deserialize_api_error(StatusCode::FORBIDDEN, b"");
        assert!(forbidden.sign_in_redirect_to("/jobs").is_none());
    }

    #[test]
    fn invalid_credentials_message() {
        let err = MediaToolsError::InvalidCredentials;
        assert_eq!(err.user_message(), "Invalid email or password");
        assert!(err.sign_in_redirect().is_none());
    }

    #[test]
    fn deser_snippet_is_capped() {
        let body = vec![b'x'; 2000];
        let e = serde_json::from_slice::<serde_json::Value>(&body).unwrap_err();
        match map_deser(&e, &body) {
            MediaToolsError::MalformedResponse(msg) => assert!(msg.len() < 600),
            other => panic!("Expected MalformedResponse, got {other:?}"),
        }
    }
}
