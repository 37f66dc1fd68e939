//! Security Configuration
//!
//! Per-route guard policies and the global security knobs.

use serde::{Deserialize, Serialize};

/// Guard policy for a single route.
///
/// Immutable once handed to a [`SecurityLayer`](crate::security::middleware::SecurityLayer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Requests allowed per window
    pub rate_limit_requests: u32,
    /// Window length in seconds
    pub rate_limit_window_seconds: u64,
    /// Require a CSRF token on state-changing methods
    pub enable_csrf: bool,
    /// Emit audit entries for guarded requests
    pub enable_audit_log: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            rate_limit_requests: 100,
            rate_limit_window_seconds: 60,
            enable_csrf: true,
            enable_audit_log: true,
        }
    }
}

impl SecurityConfig {
    /// Policy with the given per-minute budget
    pub fn per_minute(requests: u32, enable_csrf: bool) -> Self {
        Self {
            rate_limit_requests: requests,
            rate_limit_window_seconds: 60,
            enable_csrf,
            enable_audit_log: true,
        }
    }
}

/// Policies for every guarded route group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePolicies {
    pub products_read: SecurityConfig,
    pub products_write: SecurityConfig,
    pub products_delete: SecurityConfig,
    pub bulk: SecurityConfig,
    pub import: SecurityConfig,
    pub export: SecurityConfig,
    pub orders_read: SecurityConfig,
    pub orders_write: SecurityConfig,
    pub session: SecurityConfig,
}

impl Default for RoutePolicies {
    fn default() -> Self {
        Self {
            products_read: SecurityConfig::per_minute(200, false),
            products_write: SecurityConfig::per_minute(50, true),
            products_delete: SecurityConfig::per_minute(30, true),
            bulk: SecurityConfig::per_minute(20, true),
            import: SecurityConfig::per_minute(10, true),
            export: SecurityConfig::per_minute(50, false),
            orders_read: SecurityConfig::per_minute(200, false),
            orders_write: SecurityConfig::per_minute(50, true),
            session: SecurityConfig::default(),
        }
    }
}

impl RoutePolicies {
    /// Iterate policies with their names, for validation and logging
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &SecurityConfig)> {
        [
            ("products_read", &self.products_read),
            ("products_write", &self.products_write),
            ("products_delete", &self.products_delete),
            ("bulk", &self.bulk),
            ("import", &self.import),
            ("export", &self.export),
            ("orders_read", &self.orders_read),
            ("orders_write", &self.orders_write),
            ("session", &self.session),
        ]
        .into_iter()
    }
}

/// How CSRF tokens are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsrfMode {
    /// Presence and format check only
    #[default]
    Advisory,
    /// HS256 token bound to the caller's session
    Signed,
}

/// Global security settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// CSRF checking mode
    pub csrf_mode: CsrfMode,
    /// Signing secret for signed CSRF tokens
    pub csrf_secret: String,
    /// Lifetime of issued CSRF tokens
    pub csrf_token_ttl_seconds: u64,
    /// Verify bearer token signatures instead of checking presence only
    pub jwt_verification_enabled: bool,
    /// JWT secret key for token validation
    pub jwt_secret: String,
    /// JWT issuer
    pub jwt_issuer: String,
    /// JWT audience
    pub jwt_audience: String,
    /// Critical audit entries kept in memory
    pub audit_buffer_size: usize,
    /// Per-route guard policies
    pub routes: RoutePolicies,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self::development()
    }
}

impl SecuritySettings {
    /// Create development security settings
    pub fn development() -> Self {
        Self {
            csrf_mode: CsrfMode::Advisory,
            csrf_secret: "dev-csrf-secret-change-in-production-32b".to_string(),
            csrf_token_ttl_seconds: 3600,
            jwt_verification_enabled: false,
            jwt_secret: "dev-secret-change-in-production-min-32-chars".to_string(),
            jwt_issuer: "fitfoot".to_string(),
            jwt_audience: "fitfoot-admin".to_string(),
            audit_buffer_size: 1000,
            routes: RoutePolicies::default(),
        }
    }

    /// Create production security settings
    pub fn production() -> Self {
        Self {
            csrf_mode: CsrfMode::Signed,
            csrf_secret: String::new(),
            jwt_verification_enabled: true,
            jwt_secret: String::new(),
            ..Self::development()
        }
    }
}
