//! Configuration - 配置加载

mod loader;
mod types;

pub use loader::{load_config, load_config_from_path, print_config, ConfigError};
pub use types::{
    AnalysisConfig, AppConfig, CatalogConfig, DatabaseConfig, LogConfig, ServerConfig,
    WorkerConfig,
};
