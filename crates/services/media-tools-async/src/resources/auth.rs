use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde_json::Value;

use crate::{
    client::Client,
    config::{Config, HDR_X_API_KEY},
    error::{ApiErrorObject, MediaToolsError, deserialize_api_error, map_deser},
    session::{DEFAULT_SESSION_MAX_AGE, Session, sign_session, verify_session},
    types::auth::{Credentials, session_from_login},
};

const LOGIN_PATH: &str = "/auth/login/";
const REGISTER_PATH: &str = "/auth/register/";

/// API resource for authentication and the session it produces
pub struct Auth<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Auth<'c, C> {
    /// Creates a new Auth resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Signs in and stores the resulting session on the client's handle.
    ///
    /// The handle reads as pending while the request is in flight. A session
    /// held before the call stays usable meanwhile and is kept if the login
    /// fails.
    ///
    /// # Errors
    ///
    /// - [`MediaToolsError::InvalidCredentials`] when the API answers 401 or a
    ///   field is blank
    /// - [`MediaToolsError::MalformedResponse`] when a 2xx body lacks a token or email
    /// - any transport, configuration or API error from the request
    pub async fn login(&self, email: &str, password: &str) -> Result<Arc<Session>, MediaToolsError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(MediaToolsError::InvalidCredentials);
        }

        let handle = self.client.session();
        handle.begin_login().await;

        match self.request_session(email, password).await {
            Ok(session) => {
                let session = handle.establish(session).await;
                tracing::info!(user_id = session.user_id(), plan = session.plan(), "signed in");
                Ok(session)
            }
            Err(e) => {
                handle.fail_login().await;
                tracing::warn!(error = %e, "login failed");
                Err(e)
            }
        }
    }

    async fn request_session(&self, email: &str, password: &str) -> Result<Session, MediaToolsError> {
        let (status, body) = self
            .client
            .send_public(
                Method::POST,
                LOGIN_PATH,
                Some(HDR_X_API_KEY),
                Some(&Credentials { email, password }),
            )
            .await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(MediaToolsError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(deserialize_api_error(status, &body));
        }

        let value: Value = serde_json::from_slice(&body).map_err(|e| map_deser(&e, &body))?;
        session_from_login(&value)
    }

    /// Creates an account. Does not sign in.
    ///
    /// The call carries no API key header.
    ///
    /// # Errors
    ///
    /// - [`MediaToolsError::Config`] when `password` and `confirm` differ
    /// - [`MediaToolsError::Api`] for any answer other than 201, a 403 included,
    ///   carrying the server's `message` or `detail`, else "Registration failed"
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), MediaToolsError> {
        if password != confirm {
            return Err(MediaToolsError::Config("Passwords do not match".into()));
        }

        let (status, body) = self
            .client
            .send_public(
                Method::POST,
                REGISTER_PATH,
                None,
                Some(&Credentials {
                    email: email.trim(),
                    password,
                }),
            )
            .await?;

        if status == StatusCode::CREATED {
            tracing::info!(email = email.trim(), "registered");
            return Ok(());
        }

        let err = if status.is_success() {
            MediaToolsError::Api(ApiErrorObject {
                status_code: Some(status.as_u16()),
                ..Default::default()
            })
        } else {
            deserialize_api_error(status, &body)
        };

        Err(match err {
            MediaToolsError::Api(mut obj) | MediaToolsError::Forbidden(mut obj) => {
                if obj.message.trim().is_empty()
                    && obj.detail.as_deref().is_none_or(|d| d.trim().is_empty())
                {
                    obj.message = "Registration failed".into();
                }
                MediaToolsError::Api(obj)
            }
            other => other,
        })
    }

    /// Drops the current session. No server call is made.
    pub async fn logout(&self) {
        self.client.session().clear().await;
        tracing::info!("signed out");
    }

    /// Serializes the current session as a signed value for later [`Auth::restore_session`].
    ///
    /// # Errors
    ///
    /// Returns [`MediaToolsError::Config`] without a session secret and
    /// [`MediaToolsError::Session`] when nobody is signed in.
    pub async fn export_session(&self) -> Result<String, MediaToolsError> {
        let secret = self.secret()?;
        let session = self
            .client
            .session()
            .current()
            .await
            .ok_or_else(|| MediaToolsError::Session("no active session".into()))?;

        sign_session(&session, secret, chrono::Utc::now().timestamp())
    }

    /// Verifies a value from [`Auth::export_session`] and makes it the current session.
    ///
    /// # Errors
    ///
    /// Returns [`MediaToolsError::Config`] without a session secret and
    /// [`MediaToolsError::Session`] for a tampered, malformed or expired value.
    /// The handle is left untouched on error.
    pub async fn restore_session(&self, value: &str) -> Result<Arc<Session>, MediaToolsError> {
        let secret = self.secret()?;
        let session = verify_session(
            value,
            secret,
            chrono::Utc::now().timestamp(),
            DEFAULT_SESSION_MAX_AGE,
        )?;
        Ok(self.client.session().establish(session).await)
    }
}

impl<C: Config> Auth<'_, C> {
    fn secret(&self) -> Result<&SecretString, MediaToolsError> {
        self.client.config().session_secret().ok_or_else(|| {
            MediaToolsError::Config(
                "Session secret is not configured: set MEDIA_TOOLS_SESSION_SECRET".into(),
            )
        })
    }
}

impl<C: Config> crate::Client<C> {
    /// Returns the Auth API resource
    #[must_use]
    pub const fn auth(&self) -> Auth<'_, C> {
        Auth::new(self)
    }
}
