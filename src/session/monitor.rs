//! Periodic session expiry checks with automatic refresh.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::config::SessionConfig;
use crate::session::expiry::{ExpiryThresholds, TokenExpiry};
use crate::session::refresh::{TokenKind, TokenRefresher, TokenStore};

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Warning { kind: TokenKind, remaining: i64 },
    Refreshed { kind: TokenKind },
    RefreshFailed { kind: TokenKind, reason: String },
    Expired { kind: TokenKind },
}

/// Watches the stored admin token (or, failing that, the customer token).
///
/// Overlapping refreshes from separate monitors are not coordinated.
pub struct SessionMonitor {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    config: SessionConfig,
    thresholds: ExpiryThresholds,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionMonitor {
    pub fn new(
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        config: SessionConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            thresholds: ExpiryThresholds::from(&config),
            store,
            refresher,
            config,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Admin token first, then customer.
    fn current_token(&self) -> Option<(TokenKind, String)> {
        [TokenKind::Admin, TokenKind::Customer]
            .into_iter()
            .find_map(|kind| {
                self.store
                    .get(kind.storage_key(&self.config))
                    .map(|token| (kind, token))
            })
    }

    /// Runs one check and returns the events it emitted.
    pub async fn check_at(&self, now: DateTime<Utc>) -> Vec<SessionEvent> {
        let Some((kind, token)) = self.current_token() else {
            return Vec::new();
        };

        let mut emitted = Vec::new();
        match TokenExpiry::inspect(&token, now, &self.thresholds) {
            TokenExpiry::Expired => {
                self.store.remove(kind.storage_key(&self.config));
                emitted.push(SessionEvent::Expired { kind });
            }
            TokenExpiry::RefreshDue { remaining } => {
                emitted.push(SessionEvent::Warning { kind, remaining });
                match self.refresher.refresh(kind, &token).await {
                    Ok(fresh) => {
                        self.store.set(kind.storage_key(&self.config), fresh);
                        emitted.push(SessionEvent::Refreshed { kind });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, ?kind, "session token refresh failed");
                        emitted.push(SessionEvent::RefreshFailed {
                            kind,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            TokenExpiry::Expiring { remaining } => {
                emitted.push(SessionEvent::Warning { kind, remaining });
            }
            TokenExpiry::Valid { .. } | TokenExpiry::Unknown => {}
        }

        for event in &emitted {
            // no subscribers is fine
            let _ = self.events.send(event.clone());
        }
        emitted
    }

    /// Polls every `poll_interval_secs` until the task is aborted.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config.poll_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                self.check_at(Utc::now()).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::session::refresh::MemoryTokenStore;
    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRefresher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TokenRefresher for CountingRefresher {
        async fn refresh(&self, _kind: TokenKind, _token: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AppError::Upstream("refresh endpoint down".into()))
            } else {
                Ok("fresh-token".into())
            }
        }
    }

    fn token(exp: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("h.{payload}.s")
    }

    fn monitor(fail: bool) -> (SessionMonitor, Arc<MemoryTokenStore>, Arc<CountingRefresher>) {
        let store = Arc::new(MemoryTokenStore::new());
        let refresher = Arc::new(CountingRefresher {
            calls: AtomicUsize::new(0),
            fail,
        });
        let monitor = SessionMonitor::new(store.clone(), refresher.clone(), SessionConfig::default());
        (monitor, store, refresher)
    }

    #[tokio::test]
    async fn test_refresh_due_replaces_token() {
        let (monitor, store, refresher) = monitor(false);
        let now = Utc::now();
        store.set("admin_token", token(now.timestamp() + 60));
        let mut events = monitor.subscribe();

        let emitted = monitor.check_at(now).await;
        assert_eq!(
            emitted,
            vec![
                SessionEvent::Warning { kind: TokenKind::Admin, remaining: 60 },
                SessionEvent::Refreshed { kind: TokenKind::Admin },
            ]
        );
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get("admin_token").as_deref(), Some("fresh-token"));
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::Warning { .. }));
    }

    #[tokio::test]
    async fn test_warning_only_outside_refresh_window() {
        let (monitor, store, refresher) = monitor(false);
        let now = Utc::now();
        store.set("customer_token", token(now.timestamp() + 240));

        let emitted = monitor.check_at(now).await;
        assert_eq!(
            emitted,
            vec![SessionEvent::Warning { kind: TokenKind::Customer, remaining: 240 }]
        );
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_token() {
        let (monitor, store, _) = monitor(true);
        let now = Utc::now();
        let original = token(now.timestamp() + 30);
        store.set("admin_token", original.clone());

        let emitted = monitor.check_at(now).await;
        assert!(matches!(emitted.last(), Some(SessionEvent::RefreshFailed { .. })));
        assert_eq!(store.get("admin_token"), Some(original));
    }

    #[tokio::test]
    async fn test_expired_token_is_cleared() {
        let (monitor, store, _) = monitor(false);
        let now = Utc::now();
        store.set("admin_token", token(now.timestamp() - 1));

        let emitted = monitor.check_at(now).await;
        assert_eq!(emitted, vec![SessionEvent::Expired { kind: TokenKind::Admin }]);
        assert!(store.get("admin_token").is_none());
        assert!(monitor.check_at(now).await.is_empty());
    }

    #[tokio::test]
    async fn test_spawned_monitor_polls() {
        let (monitor, store, _) = monitor(false);
        store.set("admin_token", token(Utc::now().timestamp() - 1));
        let monitor = Arc::new(monitor);
        let mut events = monitor.subscribe();

        let handle = monitor.clone().spawn();
        let event = events.recv().await.unwrap();
        assert_eq!(event, SessionEvent::Expired { kind: TokenKind::Admin });
        handle.abort();
    }
}
