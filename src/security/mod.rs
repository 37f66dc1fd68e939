//! Security Module
//!
//! Guards the admin API:
//! - Rate Limiting (fixed window, injected store)
//! - CSRF Validation
//! - Input Sanitization
//! - Audit Logging
//! - Security Headers
//! - Bearer Authentication
//!
//! [`middleware::SecurityGuard`] composes the first five into a per-route layer.

pub mod audit;
pub mod auth;
pub mod claims;
pub mod config;
pub mod csrf;
pub mod headers;
pub mod middleware;
pub mod rate_limit;
pub mod sanitize;


pub use audit::{AuditLogEntry, AuditLogger, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use auth::{AdminPrincipal, Authenticator, BearerPresenceAuth, JwtAuth, Principal};
pub use config::{CsrfMode, RoutePolicies, SecurityConfig, SecuritySettings};
pub use csrf::CsrfValidator;
pub use middleware::{SecurityGuard, SecurityLayer};
pub use rate_limit::{MemoryRateLimitStore, RateLimitClient, RateLimitResult, RateLimitStore, RateLimiter};
