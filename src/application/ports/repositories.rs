//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::analysis::{AnalysisSource, IntensityLevel, Mood, Pace, Setting, TimeOfDay};
use crate::domain::book::BookSource;
use crate::domain::library::ReadingStatus;
use crate::domain::user::UserPreferences;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

// ============================================================================
// User Repository
// ============================================================================

/// 用户实体（用于持久化）
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub preferences: UserPreferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 外部服务连接实体
///
/// service 取值: "goodreads" / "spotify" / "apple-music" / "youtube-music"
/// detail_value 为各服务专属字段（用户名/显示名/storefront/频道 ID）
#[derive(Debug, Clone)]
pub struct ServiceConnectionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service: String,
    pub connected_at: DateTime<Utc>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub external_user_id: String,
    pub detail_value: String,
}

/// User Repository Port
#[async_trait]
pub trait UserRepositoryPort: Send + Sync {
    /// 保存用户
    async fn save(&self, user: &UserRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepositoryError>;

    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;

    /// 更新用户偏好
    async fn update_preferences(
        &self,
        id: Uuid,
        preferences: &UserPreferences,
    ) -> Result<(), RepositoryError>;

    /// 保存服务连接（同用户同服务覆盖）
    async fn save_connection(
        &self,
        connection: &ServiceConnectionRecord,
    ) -> Result<(), RepositoryError>;

    /// 删除服务连接，返回是否存在
    async fn delete_connection(&self, user_id: Uuid, service: &str)
        -> Result<bool, RepositoryError>;

    /// 获取用户的某个服务连接
    async fn find_connection(
        &self,
        user_id: Uuid,
        service: &str,
    ) -> Result<Option<ServiceConnectionRecord>, RepositoryError>;

    /// 获取用户的所有服务连接
    async fn find_connections(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ServiceConnectionRecord>, RepositoryError>;
}

// ============================================================================
// Book Repository
// ============================================================================

/// 书籍实体（用于持久化）
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub genres: Vec<String>,
    pub source: BookSource,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book Repository Port
#[async_trait]
pub trait BookRepositoryPort: Send + Sync {
    /// 保存书籍
    async fn save(&self, book: &BookRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找书籍
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BookRecord>, RepositoryError>;

    /// 根据 (source, external_id) 查找书籍（去重用）
    async fn find_by_source(
        &self,
        source: BookSource,
        external_id: &str,
    ) -> Result<Option<BookRecord>, RepositoryError>;
}

// ============================================================================
// Library Repository
// ============================================================================

/// 书架条目实体（用于持久化）
#[derive(Debug, Clone)]
pub struct UserBookRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub status: ReadingStatus,
    pub progress: Option<u8>,
    pub current_page: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Library Repository Port
#[async_trait]
pub trait LibraryRepositoryPort: Send + Sync {
    /// 保存书架条目
    async fn save(&self, user_book: &UserBookRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找书架条目
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserBookRecord>, RepositoryError>;

    /// 根据 (user_id, book_id) 查找书架条目
    async fn find_by_user_and_book(
        &self,
        user_id: Uuid,
        book_id: Uuid,
    ) -> Result<Option<UserBookRecord>, RepositoryError>;

    /// 获取用户的全部书架条目
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<UserBookRecord>, RepositoryError>;

    /// 删除书架条目（级联删除分析与歌单）
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

// ============================================================================
// Analysis Repository
// ============================================================================

/// 分析实体（用于持久化）
#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub user_book_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub mood: Vec<Mood>,
    pub themes: Vec<String>,
    pub setting: Setting,
    pub pace: Pace,
    pub intensity: IntensityLevel,
    pub time_of_day: Vec<TimeOfDay>,
    pub vibe: String,
    pub music_description: String,
    pub analysis_source: AnalysisSource,
    pub confidence: f64,
    pub model_used: String,
}

/// Analysis Repository Port
#[async_trait]
pub trait AnalysisRepositoryPort: Send + Sync {
    /// 保存分析（同 user_book 覆盖，保证一一对应）
    async fn save(&self, analysis: &AnalysisRecord) -> Result<(), RepositoryError>;

    /// 根据书架条目查找分析
    async fn find_by_user_book(
        &self,
        user_book_id: Uuid,
    ) -> Result<Option<AnalysisRecord>, RepositoryError>;

    /// 删除书架条目的分析
    async fn delete_by_user_book(&self, user_book_id: Uuid) -> Result<(), RepositoryError>;
}

// ============================================================================
// Playlist Repository
// ============================================================================

/// 歌单实体（用于持久化）
#[derive(Debug, Clone)]
pub struct PlaylistRecord {
    pub id: Uuid,
    pub user_book_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// 总时长（秒），由曲目派生，写入时重算
    pub total_duration: u32,
    pub generated_at: DateTime<Utc>,
    pub generation_prompt: String,
    pub spotify_playlist_id: Option<String>,
    pub apple_music_playlist_id: Option<String>,
    pub youtube_music_playlist_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 曲目实体（用于持久化）
#[derive(Debug, Clone)]
pub struct TrackRecord {
    pub id: Uuid,
    pub playlist_id: Uuid,
    /// 歌单内顺序（从 0 起）
    pub position: u32,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_secs: u32,
    pub spotify_id: Option<String>,
    pub apple_music_id: Option<String>,
    pub youtube_music_id: Option<String>,
    pub is_instrumental: Option<bool>,
    pub mood_tags: Vec<String>,
    pub ai_rationale: Option<String>,
}

/// Playlist Repository Port
#[async_trait]
pub trait PlaylistRepositoryPort: Send + Sync {
    /// 保存歌单及其曲目（单事务，total_duration 按曲目重算）
    async fn save(
        &self,
        playlist: &PlaylistRecord,
        tracks: &[TrackRecord],
    ) -> Result<(), RepositoryError>;

    /// 根据 ID 查找歌单
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PlaylistRecord>, RepositoryError>;

    /// 获取书架条目的全部歌单
    async fn find_by_user_book(
        &self,
        user_book_id: Uuid,
    ) -> Result<Vec<PlaylistRecord>, RepositoryError>;

    /// 获取歌单的曲目（按 position 排序）
    async fn find_tracks(&self, playlist_id: Uuid) -> Result<Vec<TrackRecord>, RepositoryError>;

    /// 书架条目的歌单数量
    async fn count_by_user_book(&self, user_book_id: Uuid) -> Result<usize, RepositoryError>;

    /// 激活歌单（单事务：清掉同 user_book 下其他歌单的 is_active 再置位）
    async fn activate(&self, user_book_id: Uuid, playlist_id: Uuid)
        -> Result<(), RepositoryError>;

    /// 记录导出结果（单事务：歌单外部 ID + 各曲目外部 ID）
    async fn set_external_ids(
        &self,
        playlist_id: Uuid,
        service: &str,
        external_playlist_id: &str,
        track_external_ids: &[(Uuid, String)],
    ) -> Result<(), RepositoryError>;

    /// 删除歌单及其曲目
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}
