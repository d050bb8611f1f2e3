//! Underscore - 书籍氛围歌单生成系统
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book Context: 书籍元数据
//! - Library Context: 用户书架（阅读状态）
//! - Analysis Context: AI 氛围/主题分析
//! - Playlist Context: 歌单生成与选曲
//! - User Context: 用户偏好与服务连接
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Repositories, AnalysisProvider, MusicCatalog, CatalogCache, JobManager）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: JobManager 内存实现
//! - Worker: GenerationWorker 后台任务处理
//! - Persistence: SQLite + Sled 存储
//! - Adapters: AI 分析客户端、音乐服务曲库客户端
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
