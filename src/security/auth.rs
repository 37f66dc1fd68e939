//! Authentication Module
//!
//! Admin handlers require a bearer token. Two authenticators exist:
//! - [`BearerPresenceAuth`] accepts any non-empty token and trusts the commerce
//!   backend to reject forged ones when the request is forwarded
//! - [`JwtAuth`] verifies HS256 signature, issuer, audience and expiry locally
//!
//! Claims read through [`crate::security::claims`] are never used here.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::app_state::AppState;
use crate::error::{AppError, Result};
use crate::security::claims::{PeekedClaims, bearer_token};
use crate::security::config::SecuritySettings;

pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (usually user ID)
    pub sub: String,
    /// User role
    #[serde(default)]
    pub role: Option<String>,
    /// Session identifier
    #[serde(default, rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Token expiration timestamp
    pub exp: usize,
    /// Issued at timestamp
    pub iat: usize,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Unique token ID
    pub jti: String,
}

impl Claims {
    /// Create new claims
    pub fn new(sub: String, role: Option<String>, expiry_seconds: u64, issuer: String, audience: String) -> Self {
        let iat = Utc::now().timestamp() as usize;
        Self {
            sub,
            role,
            session_id: None,
            exp: iat + expiry_seconds as usize,
            iat,
            iss: issuer,
            aud: audience,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Caller identity established by an [`Authenticator`]
#[derive(Debug, Clone)]
pub struct Principal {
    /// The raw bearer token, forwarded to upstream calls
    pub token: String,
    pub subject: Option<String>,
    pub session_id: Option<String>,
    /// Whether the token signature was checked
    pub verified: bool,
}

/// Authentication trait for different authentication methods
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Validate a bearer token and describe the caller
    async fn authenticate(&self, token: &str) -> Result<Principal>;
    /// Get the authenticator type
    fn authenticator_type(&self) -> &'static str;
}

/// Accepts any non-empty bearer token
#[derive(Debug, Clone, Default)]
pub struct BearerPresenceAuth;

#[async_trait]
impl Authenticator for BearerPresenceAuth {
    async fn authenticate(&self, token: &str) -> Result<Principal> {
        if token.trim().is_empty() {
            return Err(AppError::Authentication(AUTHENTICATION_REQUIRED.to_string()));
        }

        let claims = PeekedClaims::peek(token);
        Ok(Principal {
            token: token.to_string(),
            subject: claims.as_ref().and_then(|c| c.subject().map(str::to_string)),
            session_id: claims.as_ref().and_then(|c| c.session().map(str::to_string)),
            verified: false,
        })
    }

    fn authenticator_type(&self) -> &'static str {
        "BearerPresence"
    }
}

/// JWT based authentication
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl JwtAuth {
    /// Create new JWT authenticator
    pub fn new(secret: &str, issuer: String, audience: String) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
        }
    }

    pub fn from_settings(settings: &SecuritySettings) -> Self {
        Self::new(
            &settings.jwt_secret,
            settings.jwt_issuer.clone(),
            settings.jwt_audience.clone(),
        )
    }

    /// Validate a token and return claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.clone()]);
        validation.set_audience(&[self.audience.clone()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "bearer token rejected");
                AppError::Authentication("Invalid or expired token".to_string())
            })
    }
}

#[async_trait]
impl Authenticator for JwtAuth {
    async fn authenticate(&self, token: &str) -> Result<Principal> {
        let claims = self.validate_token(token)?;
        Ok(Principal {
            token: token.to_string(),
            session_id: claims.session_id.clone().or(Some(claims.jti.clone())),
            subject: Some(claims.sub),
            verified: true,
        })
    }

    fn authenticator_type(&self) -> &'static str {
        "JWT"
    }
}

/// JWT token generator (for issuing tokens to trusted clients and tests)
#[derive(Clone)]
pub struct JwtTokenGenerator {
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
    expiry_seconds: u64,
}

impl JwtTokenGenerator {
    pub fn new(secret: &str, issuer: String, audience: String, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            expiry_seconds,
        }
    }

    pub fn from_settings(settings: &SecuritySettings, expiry_seconds: u64) -> Self {
        Self::new(
            &settings.jwt_secret,
            settings.jwt_issuer.clone(),
            settings.jwt_audience.clone(),
            expiry_seconds,
        )
    }

    /// Generate a signed token for `sub`
    pub fn generate_token(&self, sub: &str, role: Option<&str>) -> Result<String> {
        let claims = Claims::new(
            sub.to_string(),
            role.map(str::to_string),
            self.expiry_seconds,
            self.issuer.clone(),
            self.audience.clone(),
        );
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }
}

/// Build the authenticator selected by settings
pub fn authenticator_from_settings(settings: &SecuritySettings) -> std::sync::Arc<dyn Authenticator> {
    if settings.jwt_verification_enabled {
        std::sync::Arc::new(JwtAuth::from_settings(settings))
    } else {
        std::sync::Arc::new(BearerPresenceAuth)
    }
}

/// Extractor for handlers that require an authenticated admin caller
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AdminPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(bearer_token)
            .ok_or_else(|| AppError::Authentication(AUTHENTICATION_REQUIRED.to_string()))?;

        let principal = state.authenticator.authenticate(token).await?;
        Ok(AdminPrincipal(principal))
    }
}
