//! 可观测性模块
//!
//! 提供 Prometheus 指标、结构化日志和健康检查。

pub mod logging;

pub use logging::init_tracing;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ===== Metrics =====

/// 应用指标
#[derive(Clone)]
pub struct AppMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    rate_limited_total: IntCounterVec,
    csrf_rejections_total: IntCounterVec,
    audit_critical_total: IntCounter,
    import_rows_total: IntCounterVec,
    bulk_items_total: IntCounterVec,
}

impl std::fmt::Debug for AppMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppMetrics").finish_non_exhaustive()
    }
}

impl AppMetrics {
    /// 创建并注册全部指标
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("fitfoot".to_string()), None)?;

        let requests_total = IntCounterVec::new(
            Opts::new("guarded_requests_total", "Guarded requests by scope and outcome"),
            &["scope", "outcome"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "guarded_request_duration_seconds",
                "Guarded request latency in seconds",
            ),
            &["scope"],
        )?;
        let rate_limited_total = IntCounterVec::new(
            Opts::new("rate_limited_total", "Requests rejected by the rate limiter"),
            &["scope"],
        )?;
        let csrf_rejections_total = IntCounterVec::new(
            Opts::new("csrf_rejections_total", "Requests rejected by the CSRF check"),
            &["scope"],
        )?;
        let audit_critical_total = IntCounter::new(
            "audit_critical_total",
            "Audit entries classified as critical",
        )?;
        let import_rows_total = IntCounterVec::new(
            Opts::new("import_rows_total", "CSV import rows by outcome"),
            &["outcome"],
        )?;
        let bulk_items_total = IntCounterVec::new(
            Opts::new("bulk_items_total", "Bulk operation items by action and outcome"),
            &["action", "outcome"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(rate_limited_total.clone()))?;
        registry.register(Box::new(csrf_rejections_total.clone()))?;
        registry.register(Box::new(audit_critical_total.clone()))?;
        registry.register(Box::new(import_rows_total.clone()))?;
        registry.register(Box::new(bulk_items_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            rate_limited_total,
            csrf_rejections_total,
            audit_critical_total,
            import_rows_total,
            bulk_items_total,
        })
    }

    /// 记录一次受保护请求
    pub fn record_request(&self, scope: &str, outcome: &str, elapsed: Duration) {
        self.requests_total.with_label_values(&[scope, outcome]).inc();
        self.request_duration
            .with_label_values(&[scope])
            .observe(elapsed.as_secs_f64());
    }

    /// 记录限流拒绝
    pub fn record_rate_limited(&self, scope: &str) {
        self.rate_limited_total.with_label_values(&[scope]).inc();
    }

    /// 记录 CSRF 拒绝
    pub fn record_csrf_rejection(&self, scope: &str) {
        self.csrf_rejections_total.with_label_values(&[scope]).inc();
    }

    /// 记录关键审计事件
    pub fn record_critical_audit(&self) {
        self.audit_critical_total.inc();
    }

    /// 记录导入行结果
    pub fn record_import_rows(&self, succeeded: usize, failed: usize) {
        self.import_rows_total
            .with_label_values(&["success"])
            .inc_by(succeeded as u64);
        self.import_rows_total
            .with_label_values(&["failure"])
            .inc_by(failed as u64);
    }

    /// 记录批量操作结果
    pub fn record_bulk_items(&self, action: &str, succeeded: usize, failed: usize) {
        self.bulk_items_total
            .with_label_values(&[action, "success"])
            .inc_by(succeeded as u64);
        self.bulk_items_total
            .with_label_values(&[action, "failure"])
            .inc_by(failed as u64);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::error!(error = %e, "failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub checks: Vec<HealthCheck>,
}

/// 单个健康检查项
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub healthy: bool,
    pub message: Option<String>,
}

/// 可观测性状态
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub health_checks: Arc<Mutex<Vec<HealthCheck>>>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: String, metrics: Arc<AppMetrics>) -> Self {
        Self {
            metrics,
            health_checks: Arc::new(Mutex::new(Vec::new())),
            start_time: Utc::now(),
            version,
        }
    }

    /// 添加健康检查结果，同名检查会被替换
    pub async fn add_health_check(&self, check: HealthCheck) {
        let mut checks = self.health_checks.lock().await;
        checks.retain(|c| c.name != check.name);
        checks.push(check);
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

// ===== Health Check Handlers =====

/// 获取完整健康状态
pub async fn health_check(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let checks = state.health_checks.lock().await.clone();
    let all_healthy = checks.iter().all(|c| c.healthy);

    let health_status = HealthStatus {
        status: if all_healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks,
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// Prometheus 指标端点
pub async fn metrics(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        state.metrics.gather(),
    )
}

/// 创建可观测性路由
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn test_metrics_gather() {
        let metrics = AppMetrics::new().unwrap();
        metrics.record_request("import", "ok", Duration::from_millis(12));
        metrics.record_rate_limited("import");
        metrics.record_csrf_rejection("bulk");
        metrics.record_critical_audit();
        metrics.record_import_rows(8, 2);

        let output = metrics.gather();
        assert!(output.contains("fitfoot_guarded_requests_total{outcome=\"ok\",scope=\"import\"} 1"));
        assert!(output.contains("fitfoot_rate_limited_total{scope=\"import\"} 1"));
        assert!(output.contains("fitfoot_csrf_rejections_total{scope=\"bulk\"} 1"));
        assert!(output.contains("fitfoot_audit_critical_total 1"));
        assert!(output.contains("fitfoot_import_rows_total{outcome=\"failure\"} 2"));
    }

    #[test]
    fn test_independent_registries() {
        let a = AppMetrics::new().unwrap();
        let b = AppMetrics::new().unwrap();
        a.record_critical_audit();
        assert!(b.gather().contains("fitfoot_audit_critical_total 0"));
    }

    #[tokio::test]
    async fn test_health_reports_failed_check() {
        let state = Arc::new(ObservabilityState::new(
            "0.1.0".to_string(),
            Arc::new(AppMetrics::new().unwrap()),
        ));
        state
            .add_health_check(HealthCheck {
                name: "commerce_backend".to_string(),
                healthy: false,
                message: Some("unreachable".to_string()),
            })
            .await;

        let response = create_observability_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["checks"][0]["name"], "commerce_backend");
    }
}
