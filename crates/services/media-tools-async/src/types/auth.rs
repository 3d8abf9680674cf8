//! Types for the `/auth/login/` and `/auth/register/` endpoints

use serde::Serialize;
use serde_json::Value;

use super::shape::{
    LOGIN_EMAIL_FIELDS, LOGIN_PLAN_FIELDS, LOGIN_TOKEN_FIELDS, LOGIN_USER_ID_FIELDS, first_string,
};
use crate::error::MediaToolsError;
use crate::session::{DEFAULT_PLAN, Session};

/// JSON body for `POST /auth/login/` and `POST /auth/register/`
#[derive(Clone, Serialize)]
pub struct Credentials<'a> {
    /// Account email
    pub email: &'a str,
    /// Account password
    pub password: &'a str,
}

impl std::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Builds a [`Session`] from a 2xx login body.
///
/// A body without both a bearer token and an email is malformed: the login
/// is not considered authenticated.
///
/// # Errors
///
/// Returns [`MediaToolsError::MalformedResponse`] when the token or email is absent.
pub fn session_from_login(body: &Value) -> Result<Session, MediaToolsError> {
    let token = first_string(body, LOGIN_TOKEN_FIELDS);
    let email = first_string(body, LOGIN_EMAIL_FIELDS);

    let (Some(token), Some(email)) = (token, email) else {
        return Err(MediaToolsError::MalformedResponse(
            "Login OK but missing token/email in response".into(),
        ));
    };

    let user_id = first_string(body, LOGIN_USER_ID_FIELDS).unwrap_or_else(|| email.clone());
    let plan = first_string(body, LOGIN_PLAN_FIELDS).unwrap_or_else(|| DEFAULT_PLAN.into());

    Ok(Session::new(user_id, email, token, plan))
}
