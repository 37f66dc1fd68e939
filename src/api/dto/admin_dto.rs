use serde::{Deserialize, Serialize};

use crate::security::audit::AuditLogEntry;
use crate::security::config::CsrfMode;

/// 默认返回的审计条数
pub const DEFAULT_AUDIT_LIMIT: usize = 50;

/// CSRF 令牌响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
    /// 令牌校验方式
    pub mode: CsrfMode,
    /// 签名令牌的有效期（秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// 会话令牌刷新响应
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub token: String,
}

/// 审计查询参数
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// 审计列表响应
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub entries: Vec<AuditLogEntry>,
    pub count: usize,
}

/// 导出查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
    /// 逗号分隔的商品 ID
    pub ids: Option<String>,
}

/// 通用消息响应
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
