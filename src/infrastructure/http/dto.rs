//! Data Transfer Objects

use serde::Serialize;
use uuid::Uuid;

use crate::application::ports::{
    AnalysisRecord, BookRecord, GenerationJob, PlaylistRecord, ServiceConnectionRecord,
    TrackRecord, UserBookRecord, UserRecord,
};
use crate::domain::analysis::{Mood, Setting, TimeOfDay};
use crate::domain::user::UserPreferences;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// User DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub preferences: UserPreferences,
    pub created_at: String,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            display_name: record.display_name,
            preferences: record.preferences,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// 服务连接摘要（不回传令牌）
#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub service: String,
    pub external_user_id: String,
    pub connected_at: String,
    pub expires_at: Option<String>,
}

impl From<ServiceConnectionRecord> for ConnectionResponse {
    fn from(record: ServiceConnectionRecord) -> Self {
        Self {
            service: record.service,
            external_user_id: record.external_user_id,
            connected_at: record.connected_at.to_rfc3339(),
            expires_at: record.expires_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

// ============================================================================
// Book / Library DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub genres: Vec<String>,
    pub source: String,
    pub external_id: Option<String>,
}

impl From<BookRecord> for BookResponse {
    fn from(record: BookRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            authors: record.authors,
            description: record.description,
            cover_image_url: record.cover_image_url,
            genres: record.genres,
            source: record.source.as_str().to_string(),
            external_id: record.external_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserBookResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub status: String,
    pub progress: Option<u8>,
    pub current_page: Option<u32>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl From<UserBookRecord> for UserBookResponse {
    fn from(record: UserBookRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            book_id: record.book_id,
            status: record.status.as_str().to_string(),
            progress: record.progress,
            current_page: record.current_page,
            started_at: record.started_at.map(|dt| dt.to_rfc3339()),
            finished_at: record.finished_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

// ============================================================================
// Analysis DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub user_book_id: Uuid,
    pub analyzed_at: String,
    pub mood: Vec<Mood>,
    pub themes: Vec<String>,
    pub setting: Setting,
    pub pace: String,
    pub intensity: String,
    pub time_of_day: Vec<TimeOfDay>,
    pub vibe: String,
    pub music_description: String,
    pub analysis_source: String,
    pub confidence: f64,
    pub model_used: String,
}

impl From<AnalysisRecord> for AnalysisResponse {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            id: record.id,
            user_book_id: record.user_book_id,
            analyzed_at: record.analyzed_at.to_rfc3339(),
            mood: record.mood,
            themes: record.themes,
            setting: record.setting,
            pace: record.pace.as_str().to_string(),
            intensity: record.intensity.as_str().to_string(),
            time_of_day: record.time_of_day,
            vibe: record.vibe,
            music_description: record.music_description,
            analysis_source: record.analysis_source.as_str().to_string(),
            confidence: record.confidence,
            model_used: record.model_used,
        }
    }
}

// ============================================================================
// Playlist DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub id: Uuid,
    pub user_book_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub total_duration: u32,
    pub track_count: Option<usize>,
    pub generated_at: String,
    pub generation_prompt: String,
    pub spotify_playlist_id: Option<String>,
    pub apple_music_playlist_id: Option<String>,
    pub youtube_music_playlist_id: Option<String>,
    pub is_active: bool,
}

impl From<PlaylistRecord> for PlaylistResponse {
    fn from(record: PlaylistRecord) -> Self {
        Self {
            id: record.id,
            user_book_id: record.user_book_id,
            name: record.name,
            description: record.description,
            total_duration: record.total_duration,
            track_count: None,
            generated_at: record.generated_at.to_rfc3339(),
            generation_prompt: record.generation_prompt,
            spotify_playlist_id: record.spotify_playlist_id,
            apple_music_playlist_id: record.apple_music_playlist_id,
            youtube_music_playlist_id: record.youtube_music_playlist_id,
            is_active: record.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub id: Uuid,
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

impl From<TrackRecord> for TrackResponse {
    fn from(record: TrackRecord) -> Self {
        Self {
            id: record.id,
            position: record.position,
            title: record.title,
            artist: record.artist,
            album: record.album,
            duration_secs: record.duration_secs,
            spotify_id: record.spotify_id,
            apple_music_id: record.apple_music_id,
            youtube_music_id: record.youtube_music_id,
            is_instrumental: record.is_instrumental,
            mood_tags: record.mood_tags,
            ai_rationale: record.ai_rationale,
        }
    }
}

// ============================================================================
// Job DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub user_book_id: Uuid,
    pub state: String,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    pub playlist_id: Option<Uuid>,
}

impl From<GenerationJob> for JobResponse {
    fn from(job: GenerationJob) -> Self {
        Self {
            job_id: job.job_id,
            user_book_id: job.user_book_id,
            state: job.state.as_str().to_string(),
            created_at: job.created_at.to_rfc3339(),
            completed_at: job.completed_at.map(|dt| dt.to_rfc3339()),
            error_message: job.error_message,
            playlist_id: job.playlist_id,
        }
    }
}
