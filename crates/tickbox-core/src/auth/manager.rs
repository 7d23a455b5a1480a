//! Login/logout orchestration and the observable auth state machine.
//!
//! `AuthManager` is the only writer of `AuthState`. It publishes every
//! transition on a `tokio::sync::watch` channel so a UI can re-render on
//! change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiError, AuthTransport};
use crate::models::{Credentials, FieldErrors, User};

use super::session::{SessionStore, StoredSession};
use super::state::AuthState;
use super::store::StoreError;
use super::token::{decode_claims, DecodeError};

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Email and password are required")]
    Validation,

    #[error("A login is already in progress")]
    InFlight,

    #[error(transparent)]
    Api(#[from] ApiError),

    /// 2xx response whose body reported `success: false`
    #[error("{0}")]
    Rejected(String),

    #[error("Access token could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    #[error("Session could not be saved: {0}")]
    Persist(#[from] StoreError),
}

impl LoginError {
    /// Message shown to the user in `AuthState::error`
    pub fn user_message(&self) -> String {
        match self {
            LoginError::Decode(_) => {
                "Signed in, but the user details in the token could not be read".to_string()
            }
            LoginError::Persist(_) => "Signed in, but the session could not be saved".to_string(),
            other => other.to_string(),
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            LoginError::Api(e) => e.field_errors(),
            _ => None,
        }
    }
}

/// Releases the in-flight flag when a submit finishes or is dropped.
struct InFlightGuard<'a> {
    manager: &'a AuthManager,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(manager: &'a AuthManager) -> Option<Self> {
        manager
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { manager })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        // A dropped submit future must not leave the spinner running
        self.manager.state.send_if_modified(|state| {
            let was_loading = state.loading;
            state.loading = false;
            was_loading
        });
        self.manager.in_flight.store(false, Ordering::Release);
    }
}

pub struct AuthManager {
    transport: Arc<dyn AuthTransport>,
    sessions: SessionStore,
    state: watch::Sender<AuthState>,
    in_flight: AtomicBool,
}

impl AuthManager {
    /// Create a manager in the unauthenticated state. Call `initialize` once
    /// at startup to restore a persisted session.
    pub fn new(transport: Arc<dyn AuthTransport>, sessions: SessionStore) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            transport,
            sessions,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Seed the in-memory state from the session store. No network call.
    pub fn initialize(&self) -> AuthState {
        let state = match self.sessions.load() {
            Ok(Some(stored)) => self.restore(stored),
            Ok(None) => {
                debug!("No stored session");
                AuthState::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load stored session");
                AuthState::default()
            }
        };

        self.state.send_replace(state.clone());
        state
    }

    fn restore(&self, stored: StoredSession) -> AuthState {
        let claims = decode_claims(&stored.access_token);

        if let Ok(ref claims) = claims {
            if claims.is_expired() {
                info!("Stored session has expired");
                self.discard_stored_session();
                return AuthState::default();
            }
        }

        let expires_at = claims.as_ref().ok().and_then(|c| c.expires_at);
        let user = match stored.user {
            Some(user) => user,
            None => match claims {
                Ok(claims) => {
                    debug!("Re-derived user record from stored access token");
                    claims.user
                }
                Err(e) => {
                    warn!(error = %e, "Stored session has no usable user record");
                    self.discard_stored_session();
                    return AuthState::default();
                }
            },
        };

        debug!(user_id = %user.id, "Restored session");
        AuthState::authenticated(user, stored.access_token, stored.refresh_token, None, expires_at)
    }

    fn discard_stored_session(&self) {
        if let Err(e) = self.sessions.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    /// Bearer token for authenticated requests, if logged in
    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().access_token.clone()
    }

    /// Log in with the given credentials.
    ///
    /// Blank credentials and a second submit while one is in flight are
    /// rejected without touching state. Any other failure is written to
    /// `AuthState::error` and returned. A failed attempt leaves an existing
    /// session in place.
    pub async fn submit(&self, credentials: Credentials) -> Result<User, LoginError> {
        if !credentials.is_complete() {
            debug!("Rejected login with blank credentials");
            return Err(LoginError::Validation);
        }

        let Some(_guard) = InFlightGuard::acquire(self) else {
            debug!("Rejected login while another is in flight");
            return Err(LoginError::InFlight);
        };

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
            state.field_errors = None;
        });

        match self.login(&credentials).await {
            Ok((user, state)) => {
                self.state.send_replace(state);
                info!(user_id = %user.id, "Login successful");
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                let message = e.user_message();
                let field_errors = e.field_errors().cloned();
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(message);
                    state.field_errors = field_errors;
                    state.message = None;
                });
                Err(e)
            }
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<(User, AuthState), LoginError> {
        let response = self.transport.login(credentials).await?;

        if !response.success {
            let message = response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Login was rejected by the server".to_string());
            return Err(LoginError::Rejected(message));
        }

        let claims = decode_claims(&response.access_token)?;
        let tokens = response.token_pair();

        if let Err(e) = self.sessions.save(&tokens, &claims.user) {
            self.rollback_store();
            return Err(e.into());
        }

        let state = AuthState::authenticated(
            claims.user.clone(),
            tokens.access_token,
            Some(tokens.refresh_token),
            response.message,
            claims.expires_at,
        );
        Ok((claims.user, state))
    }

    /// After a failed save, put the store back in line with the in-memory
    /// session: rewrite the previous session if there is one, else clear.
    fn rollback_store(&self) {
        let previous = self.state();
        let result = match (&previous.user, &previous.access_token) {
            (Some(user), Some(access_token)) => {
                self.sessions.write(access_token, previous.refresh_token.as_deref(), user)
            }
            _ => self.sessions.clear(),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to roll back session store");
        }
    }

    /// Clear the stored session and reset to the unauthenticated state.
    /// Never fails; storage errors are logged.
    pub fn logout(&self) {
        self.discard_stored_session();
        let changed = self.state.send_if_modified(|state| {
            if *state == AuthState::default() {
                false
            } else {
                *state = AuthState::default();
                true
            }
        });
        if changed {
            info!("Logged out");
        }
    }

    /// Clear the error fields, leaving everything else as is
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| {
            let had_error = state.error.is_some() || state.field_errors.is_some();
            state.error = None;
            state.field_errors = None;
            had_error
        });
    }
}
