//! tickbox core - the session and authentication layer of the tickbox to-do
//! app.
//!
//! Logs a user in against the auth server, decodes the issued access token
//! into a user record, persists the session across restarts, and publishes
//! an observable `AuthState` for the UI.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, AuthTransport};
pub use auth::{AuthManager, AuthState, AuthStatus, LoginError, SessionStore};
pub use config::Config;
pub use models::{Credentials, TokenPair, User};
