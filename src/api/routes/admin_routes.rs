//! Admin Routes
//!
//! CSRF 令牌、审计查询、会话状态与令牌刷新。

use axum::{
    Router,
    handler::Handler,
    routing::{get, post},
};

use crate::api::app_state::AppState;
use crate::api::handlers::admin_handler::*;

/// 创建管理辅助路由器
pub fn create_admin_router(state: &AppState) -> Router<AppState> {
    let session = state
        .guard
        .layer("session", state.config.security.routes.session);

    Router::new()
        .route("/admin/csrf-token", get(csrf_token.layer(session.clone())))
        .route("/admin/audit", get(audit_log.layer(session.clone())))
        .route("/session/status", get(session_status.layer(session.clone())))
        .route("/session/refresh", post(refresh_session.layer(session)))
}
