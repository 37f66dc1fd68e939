use anyhow::Context;
use fitfoot_admin::api::{self, app_state::AppState};
use fitfoot_admin::config::loader::ConfigLoader;
use fitfoot_admin::observability::{
    AppMetrics, HealthCheck, ObservabilityState, create_observability_router, init_tracing,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging)?;

    info!(environment = %config.environment, "Starting {}...", config.app_name);

    ConfigLoader::validate(&config).context("invalid configuration")?;
    info!("Configuration loaded successfully");

    let metrics = Arc::new(AppMetrics::new().context("failed to register metrics")?);
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app_state = AppState::new(config, metrics.clone())?;
    info!(?app_state, "Application state created");

    // 创建可观测性状态并集成路由
    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        metrics,
    ));
    observability_state
        .add_health_check(HealthCheck {
            name: "product_creator".to_string(),
            healthy: true,
            message: Some(app_state.product_creator.creator_type().to_string()),
        })
        .await;

    let api_router = api::initialize_api(app_state).await?;
    let router = create_observability_router(observability_state).merge(api_router);
    info!("API router created with observability endpoints");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
