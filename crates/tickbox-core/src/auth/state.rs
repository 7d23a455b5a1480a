use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{FieldErrors, User};

/// Where the login flow currently stands, derived from an `AuthState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Idle,
    LoggingIn,
    Authenticated,
}

/// UI-observable snapshot of the authentication state.
///
/// Only `AuthManager` produces these; the UI reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AuthState {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub field_errors: Option<FieldErrors>,
    pub message: Option<String>,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthState {
    pub fn authenticated(
        user: User,
        access_token: String,
        refresh_token: Option<String>,
        message: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user: Some(user),
            access_token: Some(access_token),
            refresh_token,
            is_authenticated: true,
            loading: false,
            error: None,
            field_errors: None,
            message,
            expires_at,
        }
    }

    pub fn status(&self) -> AuthStatus {
        if self.loading {
            AuthStatus::LoggingIn
        } else if self.is_authenticated {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Idle
        }
    }

    /// A user is present exactly when an access token is, and only then is
    /// the state authenticated.
    pub fn is_consistent(&self) -> bool {
        self.user.is_some() == self.access_token.is_some()
            && self.is_authenticated == self.user.is_some()
    }
}
