//! Untrusted Claim Extraction
//!
//! Reads the payload segment of a JWT-shaped bearer token without checking its
//! signature. The result is only good for logging, CSRF session binding and
//! expiry hints. Authentication goes through [`crate::security::auth`].

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::Deserialize;
use serde_json::Value;

/// Claims read from an unverified token payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeekedClaims {
    pub sub: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub jti: Option<String>,
    /// Expiry as unix seconds
    pub exp: Option<i64>,
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default, rename = "userId")]
    user_id: Option<Value>,
    #[serde(default, rename = "sessionId")]
    session_id: Option<Value>,
    #[serde(default)]
    jti: Option<Value>,
    #[serde(default)]
    exp: Option<Value>,
}

impl PeekedClaims {
    /// Decode the payload of `token`. Returns `None` for anything that is not a
    /// three-segment token with a JSON object payload.
    pub fn peek(token: &str) -> Option<Self> {
        let mut parts = token.split('.');
        let (_, payload, _) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let bytes = decode_segment(payload)?;
        let raw: RawClaims = serde_json::from_slice(&bytes).ok()?;

        Some(Self {
            sub: raw.sub.and_then(value_to_string),
            user_id: raw.user_id.and_then(value_to_string),
            session_id: raw.session_id.and_then(value_to_string),
            jti: raw.jti.and_then(value_to_string),
            exp: raw.exp.and_then(|v| v.as_f64()).map(|secs| secs as i64),
        })
    }

    /// Subject for audit entries: `sub`, then `userId`
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().or(self.user_id.as_deref())
    }

    /// Session identifier for audit entries: `sessionId`, then `jti`
    pub fn session(&self) -> Option<&str> {
        self.session_id.as_deref().or(self.jti.as_deref())
    }

    /// Stable key a CSRF token can be bound to
    pub fn binding_key(&self) -> Option<&str> {
        self.session().or(self.sub.as_deref())
    }
}

/// Strip a `Bearer ` prefix from an Authorization header value
pub fn bearer_token(authorization: &str) -> Option<&str> {
    let token = authorization
        .strip_prefix("Bearer ")
        .unwrap_or(authorization)
        .trim();
    (!token.is_empty()).then_some(token)
}

// Accepts url-safe or standard alphabets, with or without padding.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .ok()
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
