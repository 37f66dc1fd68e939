//! Session Token Lifecycle
//!
//! Classifies bearer tokens by remaining lifetime, refreshes them against the
//! commerce backend, and polls stored tokens in the background.

pub mod expiry;
pub mod monitor;
pub mod refresh;

pub use expiry::{ExpiryThresholds, SessionStatus, TokenExpiry};
pub use monitor::{SessionEvent, SessionMonitor};
pub use refresh::{HttpTokenRefresher, MemoryTokenStore, TokenKind, TokenRefresher, TokenStore};
