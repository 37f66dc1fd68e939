//! Audit Logging
//!
//! Every guarded request produces an [`AuditLogEntry`]. Entries touching
//! sensitive paths, or ending in 401/403/5xx, are critical and handed to the
//! configured [`AuditSink`]s. The rest are only traced.

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, warn};

use crate::security::claims::{PeekedClaims, bearer_token};

/// Path fragments that always make an entry critical
pub const SENSITIVE_PATHS: [&str; 5] = [
    "/api/auth/",
    "/api/admin/",
    "/api/products/",
    "/api/orders/",
    "/api/user/",
];

/// One audited request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub client_ip: String,
    pub user_agent: String,
    pub referer: String,
    /// Absent when the handler never produced a response
    pub response_status: Option<u16>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

impl AuditLogEntry {
    /// Build an entry from request parts and the final status
    pub fn new(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        client_ip: &str,
        status: Option<StatusCode>,
    ) -> Self {
        let header_or = |name: header::HeaderName, default: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        let claims = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .and_then(PeekedClaims::peek);

        Self {
            timestamp: Utc::now(),
            method: method.to_string(),
            url: uri.to_string(),
            client_ip: client_ip.to_string(),
            user_agent: header_or(header::USER_AGENT, "Unknown"),
            referer: header_or(header::REFERER, "Direct"),
            response_status: status.map(|s| s.as_u16()),
            user_id: claims
                .as_ref()
                .and_then(|c| c.subject().map(str::to_string)),
            session_id: claims
                .as_ref()
                .and_then(|c| c.session().map(str::to_string)),
        }
    }

    /// Sensitive path, auth failure or server error
    pub fn is_critical(&self) -> bool {
        let sensitive_path = SENSITIVE_PATHS.iter().any(|p| self.url.contains(p));
        let auth_failure = matches!(self.response_status, Some(401) | Some(403));
        let server_error = self.response_status.is_some_and(|s| s >= 500);
        sensitive_path || auth_failure || server_error
    }
}

/// Destination for critical audit entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditLogEntry);
}

/// Writes critical entries to the `audit` tracing target
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: &AuditLogEntry) {
        warn!(
            target: "audit",
            method = %entry.method,
            url = %entry.url,
            client_ip = %entry.client_ip,
            user_agent = %entry.user_agent,
            referer = %entry.referer,
            status = ?entry.response_status,
            user_id = ?entry.user_id,
            session_id = ?entry.session_id,
            "critical request"
        );
    }
}

/// Keeps the most recent critical entries in memory
#[derive(Debug)]
pub struct MemoryAuditSink {
    capacity: usize,
    entries: Mutex<VecDeque<AuditLogEntry>>,
}

impl MemoryAuditSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Newest first
    pub fn recent(&self, limit: usize) -> Vec<AuditLogEntry> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: &AuditLogEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
    }
}

/// Fans critical entries out to every sink
#[derive(Clone, Default)]
pub struct AuditLogger {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl AuditLogger {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }

    /// Logger writing only to tracing
    pub fn tracing_only() -> Self {
        Self::new(vec![Arc::new(TracingAuditSink)])
    }

    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Log an entry; returns whether it was critical
    pub async fn log(&self, entry: &AuditLogEntry) -> bool {
        if !entry.is_critical() {
            info!(
                target: "audit",
                method = %entry.method,
                url = %entry.url,
                client_ip = %entry.client_ip,
                status = ?entry.response_status,
                "request"
            );
            return false;
        }

        for sink in &self.sinks {
            sink.record(entry).await;
        }
        true
    }
}
