//! Music Catalog Port - 外部音乐服务曲库抽象
//!
//! 定义曲库搜索与远端歌单写入的抽象接口，
//! Spotify / Apple Music / YouTube Music 客户端在 infrastructure/adapters 层实现

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::user::MusicService;

/// 曲库错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 曲库搜索结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// 时长（秒）
    pub duration_secs: u32,
    /// 该服务内的曲目 ID
    pub external_id: String,
    /// 是否纯音乐（服务未标注时为 None）
    pub is_instrumental: Option<bool>,
}

/// Music Catalog Port
///
/// 一个实现对应一个外部音乐服务
#[async_trait]
pub trait MusicCatalogPort: Send + Sync {
    /// 该客户端对应的服务
    fn service(&self) -> MusicService;

    /// 曲库搜索（结果按相关度降序）
    async fn search_tracks(
        &self,
        access_token: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogError>;

    /// 在外部服务创建歌单，返回外部歌单 ID
    async fn create_playlist(
        &self,
        access_token: &str,
        external_user_id: &str,
        name: &str,
        description: Option<&str>,
        track_ids: &[String],
    ) -> Result<String, CatalogError>;

    /// 整体替换外部歌单的曲目（幂等重导出用）
    async fn replace_tracks(
        &self,
        access_token: &str,
        external_playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError>;

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
