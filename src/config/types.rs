//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// AI 分析服务配置
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// 音乐曲库配置
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Worker 配置
    #[serde(default)]
    pub worker: WorkerConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// AI 分析服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// 分析服务基础 URL
    #[serde(default = "default_analysis_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_analysis_timeout")]
    pub timeout_secs: u64,

    /// 使用的模型标识
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_analysis_url() -> String {
    "http://localhost:8100".to_string()
}

fn default_analysis_timeout() -> u64 {
    120
}

fn default_model() -> String {
    "claude-3-opus".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            url: default_analysis_url(),
            timeout_secs: default_analysis_timeout(),
            model: default_model(),
        }
    }
}

/// 音乐曲库配置
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// 搜索缓存路径（Sled）
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// 搜索缓存最大大小（字节）
    #[serde(default = "default_cache_max_size")]
    pub cache_max_size_bytes: u64,

    /// 每条搜索返回的曲目数
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// 限流重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// 退避基础延迟（毫秒）
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Spotify API 基础 URL
    #[serde(default = "default_spotify_url")]
    pub spotify_url: String,

    /// Apple Music API 基础 URL
    #[serde(default = "default_apple_music_url")]
    pub apple_music_url: String,

    /// Apple Music 开发者令牌
    #[serde(default)]
    pub apple_music_developer_token: String,

    /// Apple Music storefront
    #[serde(default = "default_storefront")]
    pub apple_music_storefront: String,

    /// YouTube Data API 基础 URL
    #[serde(default = "default_youtube_url")]
    pub youtube_url: String,
}

fn default_cache_path() -> String {
    "data/catalog_cache.sled".to_string()
}

fn default_cache_max_size() -> u64 {
    256 * 1024 * 1024 // 256MB
}

fn default_search_limit() -> usize {
    25
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_spotify_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_apple_music_url() -> String {
    "https://api.music.apple.com/v1".to_string()
}

fn default_storefront() -> String {
    "us".to_string()
}

fn default_youtube_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            cache_max_size_bytes: default_cache_max_size(),
            search_limit: default_search_limit(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            spotify_url: default_spotify_url(),
            apple_music_url: default_apple_music_url(),
            apple_music_developer_token: String::new(),
            apple_music_storefront: default_storefront(),
            youtube_url: default_youtube_url(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/underscore.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// Worker 配置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// 最大并发生成数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// 任务队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_max_concurrent() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    1000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5080);
        assert_eq!(config.analysis.url, "http://localhost:8100");
        assert_eq!(config.database.path, "data/underscore.db");
        assert_eq!(config.catalog.max_retries, 3);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5080");
    }

    #[test]
    fn test_database_url() {
        let config = DatabaseConfig::default();
        assert_eq!(config.database_url(), "sqlite:data/underscore.db?mode=rwc");
    }
}
