//! 错误处理模块
//!
//! 定义应用程序的错误类型，以及错误到 HTTP 响应的映射。
//! 5xx 错误不会把内部细节暴露给客户端。

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 对外统一的 5xx 错误消息
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 认证错误
    #[error("{0}")]
    Authentication(String),

    /// CSRF 校验失败
    #[error("{0}")]
    Csrf(String),

    /// 授权错误
    #[error("{0}")]
    Authorization(String),

    /// 速率限制
    #[error("Rate limit exceeded")]
    RateLimited {
        /// 距离窗口重置的秒数
        retry_after: u64,
        /// 当前窗口的请求上限
        limit: u32,
        /// 剩余请求数
        remaining: u32,
        /// 窗口重置时间
        reset_at: DateTime<Utc>,
    },

    /// 参数验证错误
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<String>,
    },

    /// 资源不存在
    #[error("{0}")]
    NotFound(String),

    /// 请求体超出上限
    #[error("{0}")]
    PayloadTooLarge(String),

    /// 上游服务错误
    #[error("上游服务错误: {0}")]
    Upstream(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl AppError {
    /// 创建参数验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// 创建带详细信息的参数验证错误
    pub fn validation_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// 是否为服务端错误
    pub fn is_server_error(&self) -> bool {
        let (status, _) = self.into();
        status >= 500
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Upstream(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = if status.is_server_error() {
            tracing::error!(error = %self, code = %code, "request failed");
            ErrorResponse::new(&code, INTERNAL_ERROR_MESSAGE)
        } else {
            let mut body = ErrorResponse::new(&code, &self.to_string());
            match &self {
                AppError::Validation {
                    details: Some(details),
                    ..
                } => body = body.with_details(details),
                AppError::RateLimited { retry_after, .. } => {
                    body = body.with_retry_after(*retry_after)
                }
                _ => {}
            }
            body
        };

        let mut response = (status, Json(body)).into_response();

        if let AppError::RateLimited {
            retry_after,
            limit,
            remaining,
            reset_at,
        } = &self
        {
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, HeaderValue::from(*retry_after));
            headers.insert("X-RateLimit-Limit", HeaderValue::from(*limit));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(*remaining));
            headers.insert("X-RateLimit-Reset", HeaderValue::from(reset_at.timestamp()));
        }

        response
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// 错误消息
    pub error: String,
    /// 错误代码
    pub code: String,
    /// 详细信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// 建议的重试等待秒数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
            retry_after: None,
        }
    }

    /// 添加详细信息
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    /// 添加重试等待时间
    pub fn with_retry_after(mut self, retry_after: u64) -> Self {
        self.retry_after = Some(retry_after);
        self
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::Authentication(_) => (401, "UNAUTHORIZED".to_string()),
            AppError::Csrf(_) => (403, "CSRF_REJECTED".to_string()),
            AppError::Authorization(_) => (403, "FORBIDDEN".to_string()),
            AppError::RateLimited { .. } => (429, "RATE_LIMITED".to_string()),
            AppError::Validation { .. } => (400, "VALIDATION_ERROR".to_string()),
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE".to_string()),
            AppError::Upstream(_) => (502, "UPSTREAM_ERROR".to_string()),
            AppError::Config(_) => (500, "CONFIG_ERROR".to_string()),
            AppError::Serialization(_) => (500, "SERIALIZATION_ERROR".to_string()),
            AppError::Internal(_) => (500, "INTERNAL_ERROR".to_string()),
            AppError::Io(_) => (500, "IO_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
