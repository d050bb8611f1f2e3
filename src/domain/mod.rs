//! Domain Layer - 领域层
//!
//! 包含五个限界上下文:
//! - Book Context: 书籍元数据
//! - Library Context: 用户书架（阅读状态）
//! - Analysis Context: AI 氛围/主题分析
//! - Playlist Context: 歌单生成
//! - User Context: 用户偏好与外部服务连接

pub mod analysis;
pub mod book;
pub mod library;
pub mod playlist;
pub mod user;

// 共享的提示词构造器
mod prompt;

pub use prompt::{
    build_analysis_prompt, build_playlist_prompt, build_search_queries, PromptConfig,
};
