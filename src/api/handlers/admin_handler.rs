use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use crate::{
    api::{app_state::AppState, dto::admin_dto::*},
    error::AppError,
    security::{
        auth::{AUTHENTICATION_REQUIRED, AdminPrincipal},
        claims::bearer_token,
        config::CsrfMode,
    },
    session::{ExpiryThresholds, SessionStatus, TokenKind},
};

/// 为当前调用者签发 CSRF 令牌
pub async fn csrf_token(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let csrf_token = state.csrf.issue(&principal.token)?;
    let mode = state.csrf.mode();
    let expires_in =
        (mode == CsrfMode::Signed).then_some(state.config.security.csrf_token_ttl_seconds);

    Ok(Json(CsrfTokenResponse {
        csrf_token,
        mode,
        expires_in,
    }))
}

/// 最近的关键审计记录，最新的在前
pub async fn audit_log(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Query(query): Query<AuditQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .min(state.config.security.audit_buffer_size);
    let entries = state.audit_sink.recent(limit);

    Ok(Json(AuditListResponse {
        count: entries.len(),
        entries,
    }))
}

/// 会话令牌过期状态
///
/// 只读取令牌的 `exp`，不校验签名，过期令牌同样可以查询。
pub async fn session_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Authentication(AUTHENTICATION_REQUIRED.to_string()))?;

    let thresholds = ExpiryThresholds::from(&state.config.session);
    Ok(Json(SessionStatus::for_token(token, Utc::now(), &thresholds)))
}

/// 用调用者的管理员令牌换取新令牌
///
/// 上游拒绝或不可达时返回 502。
pub async fn refresh_session(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let token = state
        .token_refresher
        .refresh(TokenKind::Admin, &principal.token)
        .await?;
    info!(subject = ?principal.subject, "Session token refreshed");

    Ok(Json(RefreshTokenResponse { token }))
}
