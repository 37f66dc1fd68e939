//! CSRF Validation
//!
//! State-changing requests must carry both an `X-CSRF-Token` header and a bearer
//! token. In advisory mode the CSRF token only has to look plausible. In signed
//! mode it must be an HS256 token issued for the caller's session.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::security::claims::{PeekedClaims, bearer_token};
use crate::security::config::{CsrfMode, SecuritySettings};
use axum::http::{HeaderMap, Method, header};

/// Header carrying the CSRF token
pub const CSRF_HEADER: &str = "X-CSRF-Token";

pub const CSRF_REQUIRED: &str = "CSRF token required";
pub const CSRF_INVALID: &str = "Invalid CSRF token";

static TOKEN_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9+/=]+$").expect("static regex"));

/// Methods that never need a CSRF token
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Advisory format rule: longer than 10 characters, base64 alphabet only
pub fn has_valid_format(token: &str) -> bool {
    token.len() > 10 && TOKEN_FORMAT.is_match(token)
}

#[derive(Debug, Serialize, Deserialize)]
struct CsrfClaims {
    sid: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies session-bound CSRF tokens
#[derive(Clone)]
pub struct CsrfSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: u64,
}

impl std::fmt::Debug for CsrfSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfSigner")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl CsrfSigner {
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    /// Issue a token bound to `session_key`
    pub fn issue(&self, session_key: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = CsrfClaims {
            sid: session_key.to_string(),
            iat: now,
            exp: now + self.ttl_seconds as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign CSRF token: {e}")))
    }

    /// Verify signature, expiry and session binding
    pub fn verify(&self, token: &str, session_key: &str) -> bool {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;

        match decode::<CsrfClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims.sid == session_key,
            Err(e) => {
                tracing::debug!(error = %e, "CSRF token rejected");
                false
            }
        }
    }
}

/// CSRF check applied by the security layer
#[derive(Debug, Clone)]
pub struct CsrfValidator {
    mode: CsrfMode,
    signer: Option<CsrfSigner>,
}

impl CsrfValidator {
    /// Presence and format check only
    pub fn advisory() -> Self {
        Self {
            mode: CsrfMode::Advisory,
            signer: None,
        }
    }

    /// Signed, session-bound tokens
    pub fn signed(signer: CsrfSigner) -> Self {
        Self {
            mode: CsrfMode::Signed,
            signer: Some(signer),
        }
    }

    pub fn from_settings(settings: &SecuritySettings) -> Self {
        match settings.csrf_mode {
            CsrfMode::Advisory => Self::advisory(),
            CsrfMode::Signed => Self::signed(CsrfSigner::new(
                &settings.csrf_secret,
                settings.csrf_token_ttl_seconds,
            )),
        }
    }

    pub fn mode(&self) -> CsrfMode {
        self.mode
    }

    /// Validate one request.
    ///
    /// Safe methods always pass. Otherwise both tokens must be present and the
    /// CSRF token must satisfy the active mode.
    pub fn validate(&self, method: &Method, headers: &HeaderMap) -> Result<()> {
        if is_safe_method(method) {
            return Ok(());
        }

        let csrf_token = headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let session_token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token);

        let (Some(csrf_token), Some(session_token)) = (csrf_token, session_token) else {
            return Err(AppError::Csrf(CSRF_REQUIRED.to_string()));
        };

        let valid = match (&self.mode, &self.signer) {
            (CsrfMode::Signed, Some(signer)) => PeekedClaims::peek(session_token)
                .as_ref()
                .and_then(PeekedClaims::binding_key)
                .is_some_and(|key| signer.verify(csrf_token, key)),
            _ => has_valid_format(csrf_token),
        };

        if valid {
            Ok(())
        } else {
            Err(AppError::Csrf(CSRF_INVALID.to_string()))
        }
    }

    /// Produce a token for the caller holding `session_token`
    pub fn issue(&self, session_token: &str) -> Result<String> {
        match (&self.mode, &self.signer) {
            (CsrfMode::Signed, Some(signer)) => {
                let claims = PeekedClaims::peek(session_token).ok_or_else(|| {
                    AppError::validation("Session token carries no session identifier")
                })?;
                let key = claims.binding_key().ok_or_else(|| {
                    AppError::validation("Session token carries no session identifier")
                })?;
                signer.issue(key)
            }
            _ => Ok(Uuid::new_v4().simple().to_string()),
        }
    }
}
