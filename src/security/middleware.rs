//! Security Middleware Module
//!
//! [`SecurityLayer`] wraps a single handler with the guard pipeline:
//!
//! 1. rate limit
//! 2. CSRF check
//! 3. JSON body sanitization
//! 4. the handler itself
//! 5. security headers
//! 6. audit entry
//!
//! A rejection at step 1 or 2 returns immediately and is audited with its
//! status. A handler panic is audited without a status and becomes a generic 500.

use axum::{
    body::Body,
    extract::{OriginalUri, Request},
    http::{HeaderValue, Method, Uri, header},
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{debug, error};

use crate::error::AppError;
use crate::observability::AppMetrics;
use crate::security::audit::{AuditLogEntry, AuditLogger};
use crate::security::config::SecurityConfig;
use crate::security::csrf::CsrfValidator;
use crate::security::headers::apply_security_headers;
use crate::security::rate_limit::{
    RateLimitClient, RateLimitInfo, RateLimitResult, RateLimitStore, RateLimiter,
};
use crate::security::sanitize::sanitize_value;

pub const BODY_TOO_LARGE: &str = "Request body too large";

/// Shared pieces every guarded route draws from
#[derive(Clone)]
pub struct SecurityGuard {
    store: Arc<dyn RateLimitStore>,
    csrf: CsrfValidator,
    audit: AuditLogger,
    metrics: Arc<AppMetrics>,
    max_body_bytes: usize,
}

impl std::fmt::Debug for SecurityGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityGuard")
            .field("csrf", &self.csrf)
            .field("audit", &self.audit)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl SecurityGuard {
    pub fn new(
        store: Arc<dyn RateLimitStore>,
        csrf: CsrfValidator,
        audit: AuditLogger,
        metrics: Arc<AppMetrics>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            store,
            csrf,
            audit,
            metrics,
            max_body_bytes,
        }
    }

    /// Layer guarding one route under `scope` with `config`
    pub fn layer(&self, scope: &str, config: SecurityConfig) -> SecurityLayer {
        SecurityLayer {
            pipeline: Arc::new(Pipeline {
                limiter: RateLimiter::new(self.store.clone(), scope, &config),
                scope: scope.to_string(),
                config,
                csrf: self.csrf.clone(),
                audit: self.audit.clone(),
                metrics: self.metrics.clone(),
                max_body_bytes: self.max_body_bytes,
            }),
        }
    }
}

struct Pipeline {
    limiter: RateLimiter,
    scope: String,
    config: SecurityConfig,
    csrf: CsrfValidator,
    audit: AuditLogger,
    metrics: Arc<AppMetrics>,
    max_body_bytes: usize,
}

/// Tower layer applying the guard pipeline
#[derive(Clone)]
pub struct SecurityLayer {
    pipeline: Arc<Pipeline>,
}

impl<S> Layer<S> for SecurityLayer {
    type Service = SecurityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityService {
            inner,
            pipeline: self.pipeline.clone(),
        }
    }
}

/// Service produced by [`SecurityLayer`]
#[derive(Clone)]
pub struct SecurityService<S> {
    inner: S,
    pipeline: Arc<Pipeline>,
}

impl<S> Service<Request> for SecurityService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Keep the instance that was polled ready.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let pipeline = self.pipeline.clone();

        Box::pin(async move { Ok(pipeline.run(req, inner).await) })
    }
}

struct RequestFacts {
    method: Method,
    uri: Uri,
    headers: axum::http::HeaderMap,
    client: RateLimitClient,
    started: Instant,
}

impl Pipeline {
    async fn run<S>(&self, req: Request, mut inner: S) -> Response
    where
        S: Service<Request, Response = Response, Error = Infallible> + Send,
        S::Future: Send,
    {
        let facts = RequestFacts {
            method: req.method().clone(),
            // Nested routers strip their prefix; audit the path the client sent.
            uri: req
                .extensions()
                .get::<OriginalUri>()
                .map(|original| original.0.clone())
                .unwrap_or_else(|| req.uri().clone()),
            headers: req.headers().clone(),
            client: RateLimitClient::from_request(&req),
            started: Instant::now(),
        };

        let rate = self.limiter.check(&facts.client).await;
        if let RateLimitResult::Limited { retry_after, limit } = &rate {
            debug!(scope = %self.scope, client = %facts.client, retry_after, "rate limited");
            self.metrics.record_rate_limited(&self.scope);
            let response = AppError::RateLimited {
                retry_after: *retry_after,
                limit: limit.limit,
                remaining: 0,
                reset_at: limit.reset_at,
            }
            .into_response();
            return self.finish(response, &facts, "rate_limited").await;
        }

        if self.config.enable_csrf {
            if let Err(rejection) = self.csrf.validate(&facts.method, &facts.headers) {
                debug!(scope = %self.scope, client = %facts.client, "CSRF rejected");
                self.metrics.record_csrf_rejection(&self.scope);
                return self
                    .finish(rejection.into_response(), &facts, "csrf_rejected")
                    .await;
            }
        }

        let req = match sanitize_body(req, self.max_body_bytes).await {
            Ok(req) => req,
            Err(rejection) => {
                return self
                    .finish(rejection.into_response(), &facts, "rejected")
                    .await;
            }
        };

        let mut response = match AssertUnwindSafe(inner.call(req)).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(never)) => match never {},
            Err(_) => {
                error!(scope = %self.scope, method = %facts.method, uri = %facts.uri, "handler panicked");
                self.audit_entry(&facts, None).await;
                let mut response =
                    AppError::Internal("handler panicked".to_string()).into_response();
                apply_security_headers(response.headers_mut());
                self.metrics
                    .record_request(&self.scope, "panic", facts.started.elapsed());
                return response;
            }
        };

        add_rate_limit_headers(&mut response, rate.info());
        let outcome = if response.status().is_server_error() {
            "error"
        } else {
            "ok"
        };
        self.finish(response, &facts, outcome).await
    }

    async fn finish(&self, mut response: Response, facts: &RequestFacts, outcome: &str) -> Response {
        apply_security_headers(response.headers_mut());
        self.audit_entry(facts, Some(response.status())).await;
        self.metrics
            .record_request(&self.scope, outcome, facts.started.elapsed());
        response
    }

    async fn audit_entry(&self, facts: &RequestFacts, status: Option<axum::http::StatusCode>) {
        if !self.config.enable_audit_log {
            return;
        }
        let entry = AuditLogEntry::new(
            &facts.method,
            &facts.uri,
            &facts.headers,
            facts.client.as_str(),
            status,
        );
        if self.audit.log(&entry).await {
            self.metrics.record_critical_audit();
        }
    }
}

/// Add rate limit headers to response
fn add_rate_limit_headers(response: &mut Response, info: &RateLimitInfo) {
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(info.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(info.remaining));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(info.reset_at.timestamp()));
}

fn is_json(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
}

/// Replace a JSON body with its sanitized form. Bodies that do not parse are
/// passed on unchanged so the handler can reject them.
async fn sanitize_body(req: Request, limit: usize) -> Result<Request, AppError> {
    if !is_json(req.headers()) {
        return Ok(req);
    }

    let (mut parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| AppError::PayloadTooLarge(BODY_TOO_LARGE.to_string()))?;

    let body = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(value) => Body::from(serde_json::to_vec(&sanitize_value(value))?),
        Err(_) => Body::from(bytes),
    };
    parts.headers.remove(header::CONTENT_LENGTH);

    Ok(Request::from_parts(parts, body))
}
