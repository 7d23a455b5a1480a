//! REST API client module for the tickbox auth server.
//!
//! This module provides the `AuthTransport` trait and its `reqwest`-backed
//! `ApiClient`, which posts credentials to `<base-url>/auth/login` and
//! returns the issued token pair.

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthTransport};
pub use error::ApiError;
