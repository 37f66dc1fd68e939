use crate::bulk::csv_import::CsvImporter;
use crate::bulk::upstream::{ProductCreator, create_product_creator};
use crate::config::AppConfig;
use crate::error::Result;
use crate::observability::AppMetrics;
use crate::security::audit::{AuditLogger, MemoryAuditSink};
use crate::security::auth::{Authenticator, authenticator_from_settings};
use crate::security::csrf::CsrfValidator;
use crate::security::middleware::SecurityGuard;
use crate::security::rate_limit::{MemoryRateLimitStore, RateLimitStore};
use crate::session::{HttpTokenRefresher, TokenRefresher};
use crate::storage::{OrderStore, ProductStore};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Product catalog
    pub products: ProductStore,
    /// Orders
    pub orders: OrderStore,
    /// Target for imported products
    pub product_creator: Arc<dyn ProductCreator>,
    /// Session token refresh against the commerce backend
    pub token_refresher: Arc<dyn TokenRefresher>,
    /// Bearer token authentication
    pub authenticator: Arc<dyn Authenticator>,
    /// Rate limit windows shared by all guarded routes
    pub rate_limit_store: Arc<dyn RateLimitStore>,
    /// Audit fan-out used by the guard
    pub audit: AuditLogger,
    /// Recent critical audit entries
    pub audit_sink: Arc<MemoryAuditSink>,
    /// CSRF validation and token issuing
    pub csrf: CsrfValidator,
    /// Builds per-route security layers
    pub guard: SecurityGuard,
    /// Prometheus metrics
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("environment", &self.config.environment)
            .field("products", &self.products.len())
            .field("orders", &self.orders.len())
            .field("product_creator", &self.product_creator.creator_type())
            .field("authenticator", &self.authenticator.authenticator_type())
            .field("csrf", &self.csrf)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state from configuration with demo-seeded stores
    pub fn new(config: AppConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let products = ProductStore::seeded();
        let product_creator = create_product_creator(&config.commerce, &products)?;
        let token_refresher: Arc<dyn TokenRefresher> = Arc::new(HttpTokenRefresher::new(
            &config.commerce.backend_url,
            Duration::from_secs(config.commerce.request_timeout_secs),
        )?);
        Ok(Self::with_parts(
            config,
            products,
            OrderStore::seeded(),
            product_creator,
            token_refresher,
            metrics,
        ))
    }

    /// Build state around explicit stores, submission target and refresher
    pub fn with_parts(
        config: AppConfig,
        products: ProductStore,
        orders: OrderStore,
        product_creator: Arc<dyn ProductCreator>,
        token_refresher: Arc<dyn TokenRefresher>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        let rate_limit_store: Arc<dyn RateLimitStore> = Arc::new(MemoryRateLimitStore::new());
        let audit_sink = Arc::new(MemoryAuditSink::new(config.security.audit_buffer_size));
        let audit = AuditLogger::tracing_only().with_sink(audit_sink.clone());
        let csrf = CsrfValidator::from_settings(&config.security);
        let authenticator = authenticator_from_settings(&config.security);
        let guard = SecurityGuard::new(
            rate_limit_store.clone(),
            csrf.clone(),
            audit.clone(),
            metrics.clone(),
            config.server.max_request_size,
        );

        Self {
            config: Arc::new(config),
            products,
            orders,
            product_creator,
            token_refresher,
            authenticator,
            rate_limit_store,
            audit,
            audit_sink,
            csrf,
            guard,
            metrics,
        }
    }

    /// Importer configured with the commerce concurrency setting
    pub fn importer(&self) -> CsvImporter {
        CsvImporter::new(self.product_creator.clone())
            .with_concurrency(self.config.commerce.import_concurrency)
            .with_metrics(self.metrics.clone())
    }
}
