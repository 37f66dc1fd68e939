use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::security::config::SecuritySettings;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒）
    pub request_timeout: u64,
    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            request_timeout: 30,
            max_request_size: 10 * 1024 * 1024,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,fitfoot_admin=debug".into(),
            structured: false,
            log_dir: None,
        }
    }
}

/// 商品写入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommerceMode {
    /// 写入进程内商品库
    #[default]
    Local,
    /// 转发到电商后端
    Remote,
}

/// 电商后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommerceConfig {
    /// 后端基础地址
    pub backend_url: String,
    /// 商品写入方式
    pub mode: CommerceMode,
    /// 单次上游请求超时（秒）
    pub request_timeout_secs: u64,
    /// 导入时并发提交的行数，1 表示顺序提交
    pub import_concurrency: usize,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:9000".into(),
            mode: CommerceMode::Local,
            request_timeout_secs: 10,
            import_concurrency: 1,
        }
    }
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// 允许的来源，"*" 表示任意
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".into()],
        }
    }
}

/// 会话令牌过期管理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 剩余时间低于该值时提示即将过期（秒）
    pub warning_threshold_secs: i64,
    /// 剩余时间低于该值时自动刷新（秒）
    pub refresh_threshold_secs: i64,
    /// 轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 管理员令牌存储键
    pub admin_token_key: String,
    /// 顾客令牌存储键
    pub customer_token_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            warning_threshold_secs: 5 * 60,
            refresh_threshold_secs: 2 * 60,
            poll_interval_secs: 60,
            admin_token_key: "admin_token".into(),
            customer_token_key: "customer_token".into(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 安全配置
    pub security: SecuritySettings,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 电商后端配置
    pub commerce: CommerceConfig,
    /// CORS 配置
    pub cors: CorsConfig,
    /// 会话配置
    pub session: SessionConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig::default(),
            security: SecuritySettings::development(),
            logging: LoggingConfig::default(),
            commerce: CommerceConfig::default(),
            cors: CorsConfig::default(),
            session: SessionConfig::default(),
            app_name: "fitfoot-admin".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        Self {
            security: SecuritySettings::production(),
            logging: LoggingConfig {
                level: "info".into(),
                structured: true,
                log_dir: Some(PathBuf::from("./logs")),
            },
            commerce: CommerceConfig {
                mode: CommerceMode::Remote,
                ..CommerceConfig::default()
            },
            cors: CorsConfig {
                allowed_origins: Vec::new(),
            },
            environment: "production".into(),
            ..Self::development()
        }
    }
}
