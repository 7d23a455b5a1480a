//! Access token decoding.
//!
//! Tokens are three base64 segments joined by `.` (header, payload,
//! signature). Only the payload is read. The signature is NOT verified: the
//! issuing server is the trust boundary, so this must not be used on tokens
//! from an untrusted channel.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::models::User;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// JWTs use the URL-safe alphabet; some issuers emit the standard one.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Expected 3 token segments, found {0}")]
    Segments(usize),

    #[error("Token payload is not valid base64")]
    Base64,

    #[error("Token payload is not a valid claims object: {0}")]
    Payload(String),
}

/// Claims read from the access token payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub user: User,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessClaims {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| Utc::now() >= exp).unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_first(self) -> String {
        match self {
            OneOrMany::One(s) => s,
            OneOrMany::Many(v) => v.into_iter().next().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    email: String,
    nameid: StringOrNumber,
    unique_name: Option<String>,
    role: Option<OneOrMany>,
    exp: Option<i64>,
}

/// Decode the payload of an access token into its claims.
///
/// `email` and `nameid` are required; a payload missing either fails with
/// `DecodeError::Payload`. `unique_name` and `role` default to `""`.
pub fn decode_claims(token: &str) -> Result<AccessClaims, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Segments(segments.len()));
    }

    let payload = segments[1];
    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .map_err(|_| DecodeError::Base64)?;

    let raw: RawClaims =
        serde_json::from_slice(&bytes).map_err(|e| DecodeError::Payload(e.to_string()))?;

    Ok(AccessClaims {
        user: User {
            email: raw.email,
            id: raw.nameid.into_string(),
            display_name: raw.unique_name.unwrap_or_default(),
            role: raw.role.map(OneOrMany::into_first).unwrap_or_default(),
        },
        expires_at: raw.exp.and_then(|secs| DateTime::from_timestamp(secs, 0)),
    })
}

/// Decode the user record from an access token, or `None` if the token is
/// malformed.
pub fn decode_user(token: &str) -> Option<User> {
    decode_claims(token).ok().map(|claims| claims.user)
}
