use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::config::{
    Config, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, MediaToolsConfig, present, validate_base,
};
use crate::error::MediaToolsError;
use crate::session::{Session, SessionHandle};

/// Media Tools API client
///
/// The client is generic over a [`Config`] implementation that provides the
/// base URL and static credentials. The bearer credential comes from the
/// injected [`SessionHandle`], read once per request.
#[derive(Debug, Clone)]
pub struct Client<C: Config> {
    http: reqwest::Client,
    config: C,
    session: SessionHandle,
}

impl Client<MediaToolsConfig> {
    /// Creates a new client with default configuration
    ///
    /// Reads the environment:
    /// - `MEDIA_TOOLS_API_BASE` for the API base URL
    /// - `MEDIA_TOOLS_API_KEY` for the static API key
    /// - `MEDIA_TOOLS_SESSION_SECRET` for signing exported sessions
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MediaToolsConfig::new())
    }
}

impl<C: Config + Default> Default for Client<C> {
    fn default() -> Self {
        Self::with_config(C::default())
    }
}

impl<C: Config> Client<C> {
    /// Creates a new client with the given configuration and no session.
    ///
    /// # Panics
    ///
    /// Panics if the reqwest client cannot be built.
    #[must_use]
    pub fn with_config(config: C) -> Self {
        Self {
            http: reqwest::Client::builder()
                .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("reqwest client"),
            config,
            session: SessionHandle::new(),
        }
    }

    /// Replaces the HTTP client with a custom one
    ///
    /// Useful for setting custom timeouts, proxies, or other HTTP configuration.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Shares an existing session handle with this client
    #[must_use]
    pub fn with_session(mut self, session: SessionHandle) -> Self {
        self.session = session;
        self
    }

    /// Returns a reference to the client's configuration
    #[must_use]
    pub const fn config(&self) -> &C {
        &self.config
    }

    /// Returns the session handle this client reads credentials from
    #[must_use]
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Returns the validated API base URL, without a trailing slash
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is missing or not absolute.
    pub fn api_base(&self) -> Result<String, MediaToolsError> {
        validate_base(self.config.api_base())
    }

    pub(crate) async fn get<O: DeserializeOwned>(&self, path: &str) -> Result<O, MediaToolsError> {
        self.execute(Method::GET, path, |rb| rb).await
    }

    pub(crate) async fn post_multipart<O: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<O, MediaToolsError> {
        self.execute(Method::POST, path, |rb| rb.multipart(form))
            .await
    }

    /// Sends a call that does not need a session or a mandatory API key
    /// (login, registration, health) and returns the raw status and body.
    ///
    /// The API key is attached under `key_header` when configured. Non-2xx answers
    /// are returned, not mapped, since each of these endpoints reads them differently.
    pub(crate) async fn send_public<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        key_header: Option<&'static str>,
        body: Option<&B>,
    ) -> Result<(StatusCode, bytes::Bytes), MediaToolsError> {
        let url = self.config.url(path)?;

        let mut headers = HeaderMap::new();
        if let (Some(name), Some(key)) = (key_header, present(self.config.api_key())) {
            headers.insert(
                name,
                HeaderValue::from_str(key)
                    .map_err(|_| MediaToolsError::Config(format!("Invalid {name} value")))?,
            );
        }

        let mut rb = self.http.request(method.clone(), url).headers(headers);
        if let Some(body) = body {
            rb = rb.json(body);
        }
        let request = rb.build()?;

        tracing::debug!(%method, path, "media-tools request");
        let response = self.http.execute(request).await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        tracing::debug!(%method, path, status = status.as_u16(), "media-tools response");
        Ok((status, bytes))
    }

    async fn execute<O, F>(&self, method: Method, path: &str, attach: F) -> Result<O, MediaToolsError>
    where
        O: DeserializeOwned,
        F: FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    {
        // Configuration problems surface before any network I/O
        let url = self.config.url(path)?;
        self.config.validate_auth()?;

        // The credential is captured here; later logins/logouts don't affect this request
        let session: Option<Arc<Session>> = self.session.current().await;
        let headers = self.config.headers(session.as_deref().map(Session::token))?;

        let request = attach(self.http.request(method.clone(), url).headers(headers)).build()?;

        tracing::debug!(%method, path, authenticated = session.is_some(), "media-tools request");
        let response = self.http.execute(request).await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|e| crate::error::map_deser(&e, &bytes));
        }

        tracing::debug!(%method, path, status = status.as_u16(), "media-tools error response");

        if status == StatusCode::UNAUTHORIZED {
            if let Some(used) = &session {
                self.session.expire(used).await;
            }
            return Err(MediaToolsError::AuthRequired {
                sign_in_route: self.config.sign_in_route().to_string(),
            });
        }

        Err(crate::error::deserialize_api_error(status, &bytes))
    }
}
