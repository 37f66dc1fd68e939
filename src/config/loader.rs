use crate::config::config::AppConfig;
use crate::security::config::CsrfMode;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "FITFOOT_";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序（后者覆盖前者）：
    /// 1. 内置开发环境默认值
    /// 2. ./config.toml
    /// 3. `FITFOOT_` 前缀的环境变量，嵌套字段用 `__` 分隔
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// 从指定路径加载配置
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        Self::figment()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// 从 TOML 字符串加载配置（不读取环境变量）
    pub fn load_from_str(toml: &str) -> Result<AppConfig, figment::Error> {
        Self::figment().merge(Toml::string(toml)).extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::development()))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.server.request_timeout == 0 {
            return Err(ConfigValidationError::InvalidRequestTimeout);
        }

        for (name, policy) in config.security.routes.iter() {
            if policy.rate_limit_requests == 0 || policy.rate_limit_window_seconds == 0 {
                return Err(ConfigValidationError::InvalidRatePolicy(name.to_string()));
            }
        }

        if config.security.csrf_mode == CsrfMode::Signed && config.security.csrf_secret.len() < 32 {
            return Err(ConfigValidationError::WeakCsrfSecret);
        }

        if config.security.jwt_verification_enabled && config.security.jwt_secret.is_empty() {
            return Err(ConfigValidationError::MissingJwtSecret);
        }

        if config.commerce.import_concurrency == 0 {
            return Err(ConfigValidationError::InvalidImportConcurrency);
        }

        if config.session.refresh_threshold_secs > config.session.warning_threshold_secs {
            return Err(ConfigValidationError::InvalidSessionThresholds);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("请求超时必须大于 0 秒")]
    InvalidRequestTimeout,

    #[error("路由 {0} 的限流策略无效，请求数与窗口必须大于 0")]
    InvalidRatePolicy(String),

    #[error("签名 CSRF 模式需要至少 32 字节的密钥")]
    WeakCsrfSecret,

    #[error("启用 JWT 校验时必须配置 jwt_secret")]
    MissingJwtSecret,

    #[error("导入并发数必须大于 0")]
    InvalidImportConcurrency,

    #[error("刷新阈值不能大于提醒阈值")]
    InvalidSessionThresholds,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config::CommerceMode;

    #[test]
    fn test_defaults_are_valid() {
        let config = ConfigLoader::load_from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.security.routes.import.rate_limit_requests, 10);
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_toml_overrides_nested_fields() {
        let config = ConfigLoader::load_from_str(
            r#"
            [server]
            port = 9090

            [commerce]
            mode = "remote"
            import_concurrency = 4

            [security.routes.bulk]
            rate_limit_requests = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.commerce.mode, CommerceMode::Remote);
        assert_eq!(config.commerce.import_concurrency, 4);
        assert_eq!(config.security.routes.bulk.rate_limit_requests, 5);
        assert_eq!(config.security.routes.bulk.rate_limit_window_seconds, 60);
        assert!(config.security.routes.bulk.enable_audit_log);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AppConfig::development();
        config.security.routes.export.rate_limit_requests = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidRatePolicy("export".into()))
        );

        let mut config = AppConfig::development();
        config.security.csrf_mode = CsrfMode::Signed;
        config.security.csrf_secret = "short".into();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::WeakCsrfSecret)
        );

        let mut config = AppConfig::development();
        config.server.request_timeout = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidRequestTimeout)
        );

        let production = AppConfig::production();
        assert!(ConfigLoader::validate(&production).is_err());
    }
}
