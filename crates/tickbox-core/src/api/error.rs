use thiserror::Error;

use crate::models::{ErrorBody, FieldErrors};

#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connect, DNS, timeout). Carries no status.
    #[error("Server unavailable")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        field_errors: Option<FieldErrors>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build an error from a non-2xx status and its raw body.
    ///
    /// The server normally answers with `{message, errors?}`. Bodies that do
    /// not parse, or carry no message, fall back to the status text.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| Self::status_message(status, body));

        ApiError::Api {
            status: status.as_u16(),
            message,
            field_errors: parsed.errors.filter(|errors| !errors.is_empty()),
        }
    }

    fn status_message(status: reqwest::StatusCode, body: &str) -> String {
        let reason = status.canonical_reason().unwrap_or("Unexpected status");
        if body.trim().is_empty() {
            format!("{} {}", status.as_u16(), reason)
        } else {
            format!("{} {}: {}", status.as_u16(), reason, Self::truncate_body(body))
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Api { field_errors, .. } => field_errors.as_ref(),
            _ => None,
        }
    }
}
