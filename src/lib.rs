//! FitFoot Admin - 电商后台管理服务
//!
//! 为后台管理 API 提供请求级安全防护（限流、CSRF、输入清洗、审计、安全响应头），
//! 以及商品的 CSV 批量导入导出和会话令牌过期管理。

pub mod api;
pub mod bulk;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod security;
pub mod session;
pub mod storage;
