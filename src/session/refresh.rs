//! Token storage and refresh against the commerce backend.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::time::Duration;

use crate::config::config::SessionConfig;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Admin,
    Customer,
}

impl TokenKind {
    pub fn refresh_path(&self) -> &'static str {
        match self {
            TokenKind::Admin => "/auth/admin/refresh",
            TokenKind::Customer => "/auth/customer/refresh",
        }
    }

    /// Storage key configured for this kind of token.
    pub fn storage_key<'a>(&self, config: &'a SessionConfig) -> &'a str {
        match self {
            TokenKind::Admin => &config.admin_token_key,
            TokenKind::Customer => &config.customer_token_key,
        }
    }
}

/// Exchanges a still-valid token for a fresh one.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, kind: TokenKind, token: &str) -> Result<String>;
}

pub struct HttpTokenRefresher {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    token: String,
}

impl HttpTokenRefresher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, kind: TokenKind, token: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, kind.refresh_path()))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "token refresh rejected with status {}",
                response.status().as_u16()
            )));
        }

        let body: RefreshResponse = response.json().await?;
        if body.token.is_empty() {
            return Err(AppError::Upstream("token refresh returned an empty token".into()));
        }
        Ok(body.token)
    }
}

/// Key-value storage for session tokens.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, token: String);
    fn remove(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: DashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.tokens.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, token: String) {
        self.tokens.insert(key.to_string(), token);
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.tokens.remove(key).map(|(_, token)| token)
    }
}
