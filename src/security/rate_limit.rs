//! Rate Limiting Module
//!
//! Fixed-window request counting per client. The counter store is injected so a
//! deployment can keep it in process memory or share it between instances.
//!
//! The limiter is advisory. Concurrent requests from one client in the same
//! instant may be counted slightly off; it never blocks or fails.

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum::http::Request;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::security::config::SecurityConfig;

/// Counter state for one client key
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    /// Requests counted in the current window
    pub count: u32,
    /// When the current window ends
    pub window_reset_at: Instant,
}

/// Outcome of recording one request against a window
#[derive(Debug, Clone, Copy)]
pub struct WindowHit {
    pub allowed: bool,
    pub count: u32,
    pub window_reset_at: Instant,
}

/// Rate limit information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Limit for the current window
    pub limit: u32,
    /// Remaining requests in current window
    pub remaining: u32,
    /// Window reset time
    pub reset_at: DateTime<Utc>,
}

/// Rate limit result
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed(RateLimitInfo),
    /// Request is rate limited
    Limited {
        /// Seconds until retry is allowed
        retry_after: u64,
        /// Rate limit info
        limit: RateLimitInfo,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    pub fn info(&self) -> &RateLimitInfo {
        match self {
            RateLimitResult::Allowed(info) => info,
            RateLimitResult::Limited { limit, .. } => limit,
        }
    }
}

/// Client identifier for rate limiting
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum RateLimitClient {
    /// IP address based client
    Ip(String),
    /// No address could be determined
    Unknown,
}

impl RateLimitClient {
    /// Create from IP address
    pub fn from_ip(ip: &str) -> Self {
        let ip = ip.trim();
        if ip.is_empty() {
            RateLimitClient::Unknown
        } else {
            RateLimitClient::Ip(ip.to_string())
        }
    }

    /// Resolve the client address of a request.
    ///
    /// Order: first `X-Forwarded-For` entry, `X-Real-IP`, the connection peer,
    /// then the `unknown` sentinel.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let headers = req.headers();

        if let Some(forwarded) = headers.get("X-Forwarded-For").and_then(|v| v.to_str().ok()) {
            if let Some(first) = forwarded.split(',').next() {
                let client = Self::from_ip(first);
                if client != RateLimitClient::Unknown {
                    return client;
                }
            }
        }

        if let Some(real_ip) = headers.get("X-Real-IP").and_then(|v| v.to_str().ok()) {
            let client = Self::from_ip(real_ip);
            if client != RateLimitClient::Unknown {
                return client;
            }
        }

        if let Some(ConnectInfo(peer)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
            return RateLimitClient::Ip(peer.ip().to_string());
        }

        RateLimitClient::Unknown
    }

    /// Get client identifier string
    pub fn as_str(&self) -> &str {
        match self {
            RateLimitClient::Ip(s) => s.as_str(),
            RateLimitClient::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RateLimitClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage backend for window counters
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record one request for `key` and report whether it fits in the window
    async fn hit(&self, key: &str, now: Instant, max: u32, window: Duration) -> WindowHit;
    /// Drop every entry whose window has ended
    async fn sweep(&self, now: Instant);
    /// Number of tracked keys
    async fn len(&self) -> usize;
    /// Clear all counters (for testing/admin)
    async fn clear(&self);
}

/// In-process counter store
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(&self, key: &str, now: Instant, max: u32, window: Duration) -> WindowHit {
        // Sweeping on every lookup keeps memory bounded without a timer.
        self.sweep(now).await;

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.count >= max {
                    return WindowHit {
                        allowed: false,
                        count: entry.count,
                        window_reset_at: entry.window_reset_at,
                    };
                }
                entry.count += 1;
                WindowHit {
                    allowed: true,
                    count: entry.count,
                    window_reset_at: entry.window_reset_at,
                }
            }
            Entry::Vacant(vacant) => {
                let entry = RateLimitEntry {
                    count: 1,
                    window_reset_at: now + window,
                };
                vacant.insert(entry);
                WindowHit {
                    allowed: max > 0,
                    count: 1,
                    window_reset_at: entry.window_reset_at,
                }
            }
        }
    }

    async fn sweep(&self, now: Instant) {
        self.entries.retain(|_, entry| entry.window_reset_at > now);
    }

    async fn len(&self) -> usize {
        self.entries.len()
    }

    async fn clear(&self) {
        self.entries.clear();
    }
}

/// Fixed-window limiter for one guarded scope
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    scope: String,
    limit: u32,
    window: Duration,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("scope", &self.scope)
            .field("limit", &self.limit)
            .field("window", &self.window)
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter for `scope` backed by `store`
    pub fn new(store: Arc<dyn RateLimitStore>, scope: impl Into<String>, config: &SecurityConfig) -> Self {
        Self {
            store,
            scope: scope.into(),
            limit: config.rate_limit_requests,
            window: Duration::from_secs(config.rate_limit_window_seconds),
        }
    }

    /// Create a limiter with its own private memory store
    pub fn in_memory(scope: impl Into<String>, config: &SecurityConfig) -> Self {
        Self::new(Arc::new(MemoryRateLimitStore::new()), scope, config)
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn key(&self, client: &RateLimitClient) -> String {
        format!("rate_limit:{}:{}", self.scope, client.as_str())
    }

    /// Check rate limit for a client
    pub async fn check(&self, client: &RateLimitClient) -> RateLimitResult {
        self.check_at(client, Instant::now()).await
    }

    /// Check rate limit for a client at an explicit instant
    pub async fn check_at(&self, client: &RateLimitClient, now: Instant) -> RateLimitResult {
        let hit = self
            .store
            .hit(&self.key(client), now, self.limit, self.window)
            .await;

        let until_reset = hit.window_reset_at.saturating_duration_since(now);
        let reset_at = Utc::now()
            + chrono::Duration::from_std(until_reset).unwrap_or_else(|_| chrono::Duration::zero());

        if hit.allowed {
            RateLimitResult::Allowed(RateLimitInfo {
                limit: self.limit,
                remaining: self.limit.saturating_sub(hit.count),
                reset_at,
            })
        } else {
            RateLimitResult::Limited {
                retry_after: retry_after_seconds(until_reset),
                limit: RateLimitInfo {
                    limit: self.limit,
                    remaining: 0,
                    reset_at,
                },
            }
        }
    }
}

/// Seconds until the window ends, rounded up and never zero
fn retry_after_seconds(until_reset: Duration) -> u64 {
    let millis = until_reset.as_millis() as u64;
    millis.div_ceil(1000).max(1)
}
