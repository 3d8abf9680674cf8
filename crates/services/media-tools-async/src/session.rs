//! Client-held session state.
//!
//! A [`SessionHandle`] is injected into the [`Client`](crate::Client) and shared
//! by every request it builds. Requests snapshot the current [`Session`] before
//! they are sent, so a login or logout racing an in-flight request never changes
//! the credential that request carries.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tokio::sync::RwLock;

use crate::error::MediaToolsError;

type HmacSha256 = Hmac<Sha256>;

/// Default lifetime of an exported session value
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Plan tier assigned when the login response names none
pub const DEFAULT_PLAN: &str = "free";

/// An authenticated identity and its bearer credential
#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    email: String,
    token: SecretString,
    plan: String,
}

impl Session {
    /// Creates a session from its parts
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
        plan: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            token: SecretString::from(token.into()),
            plan: plan.into(),
        }
    }

    /// Remote user id (falls back to the email when the API sends none)
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Identity the session was established for
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Plan tier reported at login
    #[must_use]
    pub fn plan(&self) -> &str {
        &self.plan
    }

    /// Bearer credential sent as `Authorization: Bearer ...`
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }
}

/// Observable session state
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No session is held
    #[default]
    Unauthenticated,
    /// A login call is in flight
    ///
    /// The session held before the attempt stays usable until the new one is
    /// established, and is restored if the attempt fails.
    Pending {
        /// Session held when the attempt began
        previous: Option<Arc<Session>>,
    },
    /// A session is held
    Authenticated(Arc<Session>),
}

impl SessionState {
    /// The usable session, if any
    #[must_use]
    pub const fn session(&self) -> Option<&Arc<Session>> {
        match self {
            Self::Authenticated(s) | Self::Pending { previous: Some(s) } => Some(s),
            Self::Unauthenticated | Self::Pending { previous: None } => None,
        }
    }

    /// True when a usable session is held
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// True while a login call is in flight
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Shared, cloneable handle to the session held by a client
///
/// Writes replace the whole state at once; readers get an `Arc` snapshot.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    /// Creates an unauthenticated handle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle already holding `session`
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState::Authenticated(Arc::new(session)))),
        }
    }

    /// Returns a snapshot of the current state
    pub async fn state(&self) -> SessionState {
        self.inner.read().await.clone()
    }

    /// Returns the held session, if any
    ///
    /// While a login is pending this is the session held before it began.
    pub async fn current(&self) -> Option<Arc<Session>> {
        self.inner.read().await.session().map(Arc::clone)
    }

    /// True when a session is held
    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_authenticated()
    }

    /// Stores `session`, replacing whatever was held
    pub async fn establish(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        *self.inner.write().await = SessionState::Authenticated(Arc::clone(&session));
        tracing::info!(email = %session.email, plan = %session.plan, "session established");
        session
    }

    /// Drops the held session
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        if !matches!(*guard, SessionState::Unauthenticated) {
            tracing::info!("session cleared");
        }
        *guard = SessionState::Unauthenticated;
    }

    pub(crate) async fn begin_login(&self) {
        let mut guard = self.inner.write().await;
        let previous = guard.session().map(Arc::clone);
        *guard = SessionState::Pending { previous };
    }

    /// Leaves `Pending`, putting back whatever was held before the attempt
    pub(crate) async fn fail_login(&self) {
        let mut guard = self.inner.write().await;
        if let SessionState::Pending { previous } = &mut *guard {
            let restored = previous
                .take()
                .map_or(SessionState::Unauthenticated, SessionState::Authenticated);
            *guard = restored;
        }
    }

    /// Drops the session only if it is still the one `used` was captured from.
    ///
    /// A 401 for a request sent with an older credential must not clear a session
    /// established after that request went out.
    pub(crate) async fn expire(&self, used: &Arc<Session>) -> bool {
        let mut guard = self.inner.write().await;
        let Some(held) = guard.session() else {
            return false;
        };
        if !Arc::ptr_eq(held, used) {
            return false;
        }
        tracing::info!(email = %held.email, "session expired by 401");
        *guard = if guard.is_pending() {
            SessionState::Pending { previous: None }
        } else {
            SessionState::Unauthenticated
        };
        true
    }
}

#[derive(Serialize, Deserialize)]
struct SignedPayload {
    uid: String,
    email: String,
    token: String,
    plan: String,
    iat: i64,
}

/// Encodes `session` as `<payload>.<signature>`, both base64url.
///
/// # Errors
///
/// Returns [`MediaToolsError::Config`] if the secret is blank.
pub fn sign_session(
    session: &Session,
    secret: &SecretString,
    issued_at: i64,
) -> Result<String, MediaToolsError> {
    let payload = SignedPayload {
        uid: session.user_id.clone(),
        email: session.email.clone(),
        token: session.token.expose_secret().to_string(),
        plan: session.plan.clone(),
        iat: issued_at,
    };
    let json = serde_json::to_vec(&payload)
        .map_err(|e| MediaToolsError::Session(format!("encode session: {e}")))?;
    let body = URL_SAFE_NO_PAD.encode(json);

    let mut mac = mac_for(secret)?;
    mac.update(body.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{body}.{signature}"))
}

/// Verifies a value produced by [`sign_session`] and rebuilds the session.
///
/// # Errors
///
/// Returns [`MediaToolsError::Session`] when the value is malformed, the
/// signature does not match, or it is older than `max_age`.
pub fn verify_session(
    value: &str,
    secret: &SecretString,
    now: i64,
    max_age: Duration,
) -> Result<Session, MediaToolsError> {
    let (body, signature) = value
        .trim()
        .split_once('.')
        .ok_or_else(|| MediaToolsError::Session("malformed session value".into()))?;

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| MediaToolsError::Session("malformed session signature".into()))?;
    let mut mac = mac_for(secret)?;
    mac.update(body.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| MediaToolsError::Session("session signature mismatch".into()))?;

    let json = URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|_| MediaToolsError::Session("malformed session payload".into()))?;
    let payload: SignedPayload = serde_json::from_slice(&json)
        .map_err(|e| MediaToolsError::Session(format!("decode session: {e}")))?;

    let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
    if now.saturating_sub(payload.iat) > max_age {
        return Err(MediaToolsError::Session("session expired".into()));
    }
    if payload.token.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(MediaToolsError::Session("session missing token or email".into()));
    }

    Ok(Session::new(
        payload.uid,
        payload.email,
        payload.token,
        payload.plan,
    ))
}

fn mac_for(secret: &SecretString) -> Result<HmacSha256, MediaToolsError> {
    let key = secret.expose_secret();
    if key.trim().is_empty() {
        return Err(MediaToolsError::Config(
            "Session secret is not configured: set MEDIA_TOOLS_SESSION_SECRET".into(),
        ));
    }
    HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| MediaToolsError::Config(format!("Invalid session secret: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Session {
        Session::new("42", "a@x.com", "tok-abc", "pro")
    }

    #[tokio::test]
    async fn starts_unauthenticated() {
        let handle = SessionHandle::new();
        assert!(matches!(handle.state().await, SessionState::Unauthenticated));
        assert!(handle.current().await.is_none());
    }

    #[tokio::test]
    async fn failed_login_restores_previous_session() {
        let handle = SessionHandle::with_session(sample());
        let held = handle.current().await.unwrap();

        handle.begin_login().await;
        assert!(handle.state().await.is_pending());
        let during = handle.current().await.unwrap();
        assert!(Arc::ptr_eq(&held, &during));

        handle.fail_login().await;
        let state = handle.state().await;
        assert!(!state.is_pending());
        assert!(Arc::ptr_eq(state.session().unwrap(), &held));
    }

    #[tokio::test]
    async fn failed_first_login_stays_signed_out() {
        let handle = SessionHandle::new();
        handle.begin_login().await;
        assert!(matches!(
            handle.state().await,
            SessionState::Pending { previous: None }
        ));
        assert!(handle.current().await.is_none());

        handle.fail_login().await;
        assert!(matches!(handle.state().await, SessionState::Unauthenticated));
    }

    #[tokio::test]
    async fn expire_during_login_drops_previous_session() {
        let handle = SessionHandle::with_session(sample());
        let held = handle.current().await.unwrap();
        handle.begin_login().await;

        assert!(handle.expire(&held).await);
        assert!(handle.state().await.is_pending());
        assert!(handle.current().await.is_none());

        handle.fail_login().await;
        assert!(matches!(handle.state().await, SessionState::Unauthenticated));
    }

    #[tokio::test]
    async fn snapshot_survives_clear() {
        let handle = SessionHandle::new();
        handle.establish(sample()).await;

        let snapshot = handle.current().await.unwrap();
        handle.clear().await;

        assert_eq!(snapshot.token().expose_secret(), "tok-abc");
        assert!(!handle.is_authenticated().await);
    }

    #[tokio::test]
    async fn expire_ignores_stale_snapshot() {
        let handle = SessionHandle::new();
        let old = handle.establish(sample()).await;
        let fresh = handle
            .establish(Session::new("43", "b@x.com", "tok-new", "free"))
            .await;

        assert!(!handle.expire(&old).await);
        assert!(handle.is_authenticated().await);

        assert!(handle.expire(&fresh).await);
        assert!(!handle.is_authenticated().await);
    }

    #[test]
    fn debug_redacts_token() {
        let dbg = format!("{:?}", sample());
        assert!(!dbg.contains("tok-abc"));
    }

    #[test]
    fn signed_session_round_trip() {
        let secret = SecretString::from("signing-secret");
        let value = sign_session(&sample(), &secret, 1_000).unwrap();

        let restored =
            verify_session(&value, &secret, 1_060, DEFAULT_SESSION_MAX_AGE).unwrap();
        assert_eq!(restored.email(), "a@x.com");
        assert_eq!(restored.user_id(), "42");
        assert_eq!(restored.plan(), "pro");
        assert_eq!(restored.token().expose_secret(), "tok-abc");
    }

    #[test]
    fn tampered_session_rejected() {
        let secret = SecretString::from("signing-secret");
        let value = sign_session(&sample(), &secret, 1_000).unwrap();
        let (body, sig) = value.split_once('.').unwrap();

        let forged_body = URL_SAFE_NO_PAD.encode(
            br#"{"uid":"1","email":"evil@x.com","token":"t","plan":"pro","iat":1000}"#,
        );
        let forged = format!("{forged_body}.{sig}");
        assert!(verify_session(&forged, &secret, 1_000, DEFAULT_SESSION_MAX_AGE).is_err());

        let other = SecretString::from("other-secret");
        assert!(verify_session(&value, &other, 1_000, DEFAULT_SESSION_MAX_AGE).is_err());

        assert!(verify_session(body, &secret, 1_000, DEFAULT_SESSION_MAX_AGE).is_err());
    }

    #[test]
    fn expired_session_rejected() {
        let secret = SecretString::from("signing-secret");
        let value = sign_session(&sample(), &secret, 0).unwrap();

        match verify_session(&value, &secret, 120, Duration::from_secs(60)) {
            Err(MediaToolsError::Session(msg)) => assert!(msg.contains("expired")),
            other => panic!("Expected Session error, got {other:?}"),
        }
    }

    #[test]
    fn blank_secret_is_config_error() {
        let secret = SecretString::from("  ");
        assert!(matches!(
            sign_session(&sample(), &secret, 0),
            Err(MediaToolsError::Config(_))
        ));
    }
}
