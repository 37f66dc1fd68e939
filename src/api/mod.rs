//! API 模块
//!
//! 提供后台管理 REST API。所有路由挂载在 `/api` 下，
//! 每个处理器由各自的安全层保护。

#[cfg(test)]
mod api_tests;
pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use crate::api::app_state::AppState;
use crate::config::config::{CorsConfig, ServerConfig};
use crate::error::AppError;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// 根据配置构建 CORS 层
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ]);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// 整体请求超时，超时返回 408
pub fn timeout_layer(config: &ServerConfig) -> TimeoutLayer {
    TimeoutLayer::new(Duration::from_secs(config.request_timeout))
}

pub fn create_router(app_state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::product_routes::create_product_router(&app_state))
        .merge(routes::order_routes::create_order_router(&app_state))
        .merge(routes::admin_routes::create_admin_router(&app_state));

    let body_limit = app_state.config.server.max_request_size;
    let cors = cors_layer(&app_state.config.cors);
    let timeout = timeout_layer(&app_state.config.server);

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(timeout)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn initialize_api(app_state: AppState) -> Result<Router, AppError> {
    tracing::info!(
        environment = %app_state.config.environment,
        csrf_mode = ?app_state.csrf.mode(),
        product_creator = app_state.product_creator.creator_type(),
        "Initializing API router..."
    );
    Ok(create_router(app_state))
}
