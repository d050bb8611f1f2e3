//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `UNDERSCORE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `UNDERSCORE_SERVER__HOST=127.0.0.1`
/// - `UNDERSCORE_SERVER__PORT=8080`
/// - `UNDERSCORE_ANALYSIS__URL=http://ai-server:8100`
/// - `UNDERSCORE_DATABASE__PATH=/data/underscore.db`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5080)?
        .set_default("analysis.url", "http://localhost:8100")?
        .set_default("analysis.timeout_secs", 120)?
        .set_default("analysis.model", "claude-3-opus")?
        .set_default("catalog.cache_path", "data/catalog_cache.sled")?
        .set_default("catalog.cache_max_size_bytes", 256_u64 * 1024 * 1024)?
        .set_default("catalog.search_limit", 25)?
        .set_default("catalog.max_retries", 3)?
        .set_default("catalog.base_delay_ms", 1000)?
        .set_default("catalog.spotify_url", "https://api.spotify.com/v1")?
        .set_default("catalog.apple_music_url", "https://api.music.apple.com/v1")?
        .set_default("catalog.apple_music_developer_token", "")?
        .set_default("catalog.apple_music_storefront", "us")?
        .set_default("catalog.youtube_url", "https://www.googleapis.com/youtube/v3")?
        .set_default("database.path", "data/underscore.db")?
        .set_default("database.max_connections", 5)?
        .set_default("worker.max_concurrent", 2)?
        .set_default("worker.queue_capacity", 1000)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: UNDERSCORE_
    // 层级分隔符: __ (双下划线)
    // 例如: UNDERSCORE_ANALYSIS__URL=http://ai-server:8100
    builder = builder.add_source(
        Environment::with_prefix("UNDERSCORE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证端口范围
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    // 验证分析服务 URL
    if config.analysis.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Analysis URL cannot be empty".to_string(),
        ));
    }

    // 验证数据库路径
    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    // 验证 Worker 并发数
    if config.worker.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "Worker max_concurrent cannot be 0".to_string(),
        ));
    }

    // 验证任务队列容量
    if config.worker.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "Worker queue_capacity cannot be 0".to_string(),
        ));
    }

    // 验证曲库搜索条数
    if config.catalog.search_limit == 0 {
        return Err(ConfigError::ValidationError(
            "Catalog search_limit cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Analysis URL: {}", config.analysis.url);
    tracing::info!("Analysis Model: {}", config.analysis.model);
    tracing::info!("Analysis Timeout: {}s", config.analysis.timeout_secs);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Catalog Cache: {}", config.catalog.cache_path);
    tracing::info!("Catalog Search Limit: {}", config.catalog.search_limit);
    tracing::info!("Catalog Max Retries: {}", config.catalog.max_retries);
    tracing::info!("Worker Max Concurrent: {}", config.worker.max_concurrent);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_analysis_url() {
        let mut config = AppConfig::default();
        config.analysis.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_db_path() {
        let mut config = AppConfig::default();
        config.database.path = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_concurrency() {
        let mut config = AppConfig::default();
        config.worker.max_concurrent = 0;
        assert!(validate_config(&config).is_err());
    }
}
