//! Product submission targets for imports.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::config::{CommerceConfig, CommerceMode};
use crate::error::{AppError, Result};
use crate::models::{CreateProductRequest, Product};
use crate::storage::ProductStore;

/// Accepts validated product-creation requests, one call per imported row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductCreator: Send + Sync {
    /// Creates a product on behalf of the caller holding `token`.
    async fn create_product(&self, request: CreateProductRequest, token: &str) -> Result<Product>;

    fn creator_type(&self) -> &'static str;
}

#[async_trait]
impl ProductCreator for ProductStore {
    async fn create_product(&self, request: CreateProductRequest, _token: &str) -> Result<Product> {
        Ok(self.create(request))
    }

    fn creator_type(&self) -> &'static str {
        "local"
    }
}

/// HTTP client for the commerce backend's admin product endpoint.
pub struct CommerceClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CreateProductResponse {
    Wrapped { product: Product },
    Bare(Product),
}

impl CommerceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &CommerceConfig) -> Result<Self> {
        Self::new(
            &config.backend_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ProductCreator for CommerceClient {
    async fn create_product(&self, request: CreateProductRequest, token: &str) -> Result<Product> {
        let response = self
            .client
            .post(format!("{}/admin/products", self.base_url))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "commerce backend returned {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        match response.json::<CreateProductResponse>().await? {
            CreateProductResponse::Wrapped { product } | CreateProductResponse::Bare(product) => {
                Ok(product)
            }
        }
    }

    fn creator_type(&self) -> &'static str {
        "remote"
    }
}

/// Picks the submission target for the configured commerce mode.
pub fn create_product_creator(
    config: &CommerceConfig,
    store: &ProductStore,
) -> Result<Arc<dyn ProductCreator>> {
    match config.mode {
        CommerceMode::Remote => Ok(Arc::new(CommerceClient::from_config(config)?)),
        CommerceMode::Local => Ok(Arc::new(store.clone())),
    }
}
