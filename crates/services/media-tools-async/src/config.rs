use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::MediaToolsError;

/// Environment variable holding the API base URL
pub const ENV_API_BASE: &str = "MEDIA_TOOLS_API_BASE";
/// Environment variable holding the static API key
pub const ENV_API_KEY: &str = "MEDIA_TOOLS_API_KEY";
/// Environment variable holding the session-signing secret
pub const ENV_SESSION_SECRET: &str = "MEDIA_TOOLS_SESSION_SECRET";

/// Header carrying the static API key on processing and job calls
pub const HDR_API_KEY: &str = "api-key";
/// Header carrying the static API key on the login call
pub const HDR_X_API_KEY: &str = "x-api-key";

/// Route callers are sent to when a call answers 401
pub const DEFAULT_SIGN_IN_ROUTE: &str = "/login";
/// Query parameter carrying the page to return to after signing in
pub const SIGN_IN_RETURN_PARAM: &str = "callbackUrl";
/// Request timeout, sized for large uploads
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Media Tools client
///
/// Debug output redacts the API key and session secret via [`SecretString`].
#[derive(Clone, Debug)]
pub struct MediaToolsConfig {
    api_base: Option<String>,
    api_key: Option<SecretString>,
    session_secret: Option<SecretString>,
    sign_in_route: String,
    api_key_required: bool,
}

/// Helper to read and normalize an env var (trim + filter empty).
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for MediaToolsConfig {
    fn default() -> Self {
        Self {
            api_base: env_trimmed(ENV_API_BASE),
            api_key: env_trimmed(ENV_API_KEY).map(SecretString::from),
            session_secret: env_trimmed(ENV_SESSION_SECRET).map(SecretString::from),
            sign_in_route: DEFAULT_SIGN_IN_ROUTE.into(),
            api_key_required: true,
        }
    }
}

impl MediaToolsConfig {
    /// Creates a new configuration from the environment
    ///
    /// Reads:
    /// - `MEDIA_TOOLS_API_BASE` for the API base URL (no default)
    /// - `MEDIA_TOOLS_API_KEY` for the static API key
    /// - `MEDIA_TOOLS_SESSION_SECRET` for signing exported sessions
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Sets the static API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Removes the static API key, including one picked up from the environment
    #[must_use]
    pub fn without_api_key(mut self) -> Self {
        self.api_key = None;
        self
    }

    /// Sets the secret used to sign exported sessions
    #[must_use]
    pub fn with_session_secret(mut self, secret: impl Into<String>) -> Self {
        self.session_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Sets the route reported by [`MediaToolsError::sign_in_redirect`]
    #[must_use]
    pub fn with_sign_in_route(mut self, route: impl Into<String>) -> Self {
        self.sign_in_route = route.into();
        self
    }

    /// Controls whether processing and job calls fail fast without an API key
    ///
    /// Defaults to `true`.
    #[must_use]
    pub const fn with_api_key_required(mut self, required: bool) -> Self {
        self.api_key_required = required;
        self
    }

    /// Returns the configured API base URL, if any
    #[must_use]
    pub fn api_base(&self) -> Option<&str> {
        self.api_base.as_deref()
    }
}

/// Configuration trait for the Media Tools client
///
/// Implement this trait to provide custom authentication and API configuration.
pub trait Config: Send + Sync {
    /// Returns the raw API base URL, if configured
    fn api_base(&self) -> Option<&str>;

    /// Returns the static API key, if configured
    fn api_key(&self) -> Option<&SecretString>;

    /// Returns the session-signing secret, if configured
    fn session_secret(&self) -> Option<&SecretString>;

    /// Returns the route callers should navigate to after a 401
    fn sign_in_route(&self) -> &str;

    /// Whether processing and job calls require the static API key
    fn api_key_required(&self) -> bool;

    /// Builds request headers for a processing or job call
    ///
    /// # Errors
    ///
    /// Returns an error if header values contain invalid characters.
    fn headers(&self, bearer: Option<&SecretString>) -> Result<HeaderMap, MediaToolsError> {
        let mut h = HeaderMap::new();

        if let Some(key) = present(self.api_key()) {
            h.insert(
                HDR_API_KEY,
                HeaderValue::from_str(key)
                    .map_err(|_| MediaToolsError::Config("Invalid api-key value".into()))?,
            );
        }

        if let Some(token) = present(bearer) {
            let mut v = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| MediaToolsError::Config("Invalid Authorization header".into()))?;
            v.set_sensitive(true);
            h.insert(AUTHORIZATION, v);
        }

        Ok(h)
    }

    /// Constructs the full URL for an API endpoint
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is missing or not absolute.
    fn url(&self, path: &str) -> Result<String, MediaToolsError> {
        let base = validate_base(self.api_base())?;
        Ok(join_url(&base, path))
    }

    /// Validates that the credentials required for processing calls are present.
    ///
    /// # Errors
    ///
    /// Returns an error if an API key is required but missing or blank.
    fn validate_auth(&self) -> Result<(), MediaToolsError> {
        if !self.api_key_required() || present(self.api_key()).is_some() {
            return Ok(());
        }
        Err(MediaToolsError::Config(
            "Missing Media Tools credentials: set MEDIA_TOOLS_API_KEY".into(),
        ))
    }
}

impl Config for MediaToolsConfig {
    fn api_base(&self) -> Option<&str> {
        self.api_base.as_deref()
    }

    fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    fn session_secret(&self) -> Option<&SecretString> {
        self.session_secret.as_ref()
    }

    fn sign_in_route(&self) -> &str {
        &self.sign_in_route
    }

    fn api_key_required(&self) -> bool {
        self.api_key_required
    }
}

/// Exposes a secret only when it is non-blank, trimmed.
pub(crate) fn present(secret: Option<&SecretString>) -> Option<&str> {
    secret
        .map(|s| s.expose_secret().trim())
        .filter(|s| !s.is_empty())
}

/// Checks that `base` is a non-empty absolute http(s) URL and returns it without
/// a trailing slash.
///
/// # Errors
///
/// Returns [`MediaToolsError::Config`] when the base is missing or unusable.
pub fn validate_base(base: Option<&str>) -> Result<String, MediaToolsError> {
    let raw = base.map(str::trim).filter(|b| !b.is_empty()).ok_or_else(|| {
        MediaToolsError::Config("API base URL is not configured: set MEDIA_TOOLS_API_BASE".into())
    })?;

    let parsed = url::Url::parse(raw)
        .map_err(|e| MediaToolsError::Config(format!("Invalid API base URL {raw:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
        return Err(MediaToolsError::Config(format!(
            "API base URL must be an absolute http(s) URL, got {raw:?}"
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// Joins a base URL and an endpoint path with exactly one slash between them.
///
/// Trailing slashes on `path` are preserved; several endpoints require them.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EnvGuard;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn config_reads_env_vars() {
        let _base = EnvGuard::set(ENV_API_BASE, "https://media.example.com/api/v1");
        let _key = EnvGuard::set(ENV_API_KEY, "  key-123 \n");
        let _secret = EnvGuard::set(ENV_SESSION_SECRET, "s3cret");

        let cfg = MediaToolsConfig::new();
        assert_eq!(cfg.api_base(), Some("https://media.example.com/api/v1"));
        assert!(cfg.validate_auth().is_ok());
        assert!(Config::session_secret(&cfg).is_some());

        let h = cfg.headers(None).unwrap();
        assert_eq!(h.get(HDR_API_KEY).unwrap().to_str().unwrap(), "key-123");
    }

    #[test]
    #[serial(env)]
    fn missing_base_is_config_error() {
        let _g = EnvGuard::clear_all();

        let cfg = MediaToolsConfig::new();
        match cfg.url("/health/") {
            Err(MediaToolsError::Config(msg)) => assert!(msg.contains("MEDIA_TOOLS_API_BASE")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn relative_or_blank_base_rejected() {
        for base in ["", "   ", "/api/v1", "media.example.com", "ftp://media.example.com"] {
            let cfg = MediaToolsConfig::new().with_api_base(base);
            assert!(cfg.url("/jobs/1").is_err(), "base {base:?} should be rejected");
        }
    }

    #[test]
    fn url_joins_with_single_slash() {
        let cfg = MediaToolsConfig::new().with_api_base("https://media.example.com/api/v1/");
        assert_eq!(
            cfg.url("/video/trim/").unwrap(),
            "https://media.example.com/api/v1/video/trim/"
        );
        assert_eq!(
            cfg.url("health/").unwrap(),
            "https://media.example.com/api/v1/health/"
        );
    }

    #[test]
    fn headers_carry_key_and_bearer_together() {
        let cfg = MediaToolsConfig::new().with_api_key("k123");
        let bearer = SecretString::from("t123");

        let h = cfg.headers(Some(&bearer)).unwrap();
        assert_eq!(h.get(HDR_API_KEY).unwrap().to_str().unwrap(), "k123");
        assert_eq!(h.get(AUTHORIZATION).unwrap().to_str().unwrap(), "Bearer t123");
    }

    #[test]
    fn headers_skip_blank_bearer() {
        let cfg = MediaToolsConfig::new().without_api_key();
        let bearer = SecretString::from("   ");

        let h = cfg.headers(Some(&bearer)).unwrap();
        assert!(h.is_empty());
    }

    #[test]
    fn invalid_header_values_error() {
        let cfg = MediaToolsConfig::new().with_api_key("bad\nkey");
        match cfg.headers(None) {
            Err(MediaToolsError::Config(msg)) => assert!(msg.contains("api-key")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn validate_auth_respects_requirement() {
        let cfg = MediaToolsConfig::new().without_api_key();
        assert!(cfg.validate_auth().is_err());

        let cfg = MediaToolsConfig::new().with_api_key("   ");
        assert!(cfg.validate_auth().is_err());

        let cfg = MediaToolsConfig::new()
            .without_api_key()
            .with_api_key_required(false);
        assert!(cfg.validate_auth().is_ok());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = MediaToolsConfig::new()
            .with_api_key("super-secret-key-12345")
            .with_session_secret("signing-secret-67890");
        let debug_str = format!("{cfg:?}");

        assert!(!debug_str.contains("super-secret-key-12345"));
        assert!(!debug_str.contains("signing-secret-67890"));
        assert!(
            debug_str.contains("[REDACTED]"),
            "Debug output should contain '[REDACTED]', got: {debug_str}"
        );
    }
}
