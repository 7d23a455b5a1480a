//! Data models for the authentication flow.
//!
//! This module contains the data structures exchanged with the auth server
//! and held in the session:
//!
//! - `Credentials`: email/password pair submitted at login
//! - `TokenPair`: access and refresh tokens issued by the server
//! - `User`: user record decoded from the access token
//! - `LoginResponse`, `ErrorBody`: wire formats of the login endpoint

pub mod auth;

pub use auth::{Credentials, ErrorBody, FieldErrors, LoginRequest, LoginResponse, TokenPair, User};
