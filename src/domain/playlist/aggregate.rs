//! Playlist Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::MusicService;

use super::PlaylistError;

/// 歌单唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaylistId(Uuid);

impl PlaylistId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaylistId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 曲目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// 时长（秒）
    pub duration_secs: u32,
    pub spotify_id: Option<String>,
    pub apple_music_id: Option<String>,
    pub youtube_music_id: Option<String>,
    pub is_instrumental: Option<bool>,
    pub mood_tags: Vec<String>,
    /// AI 选曲理由
    pub ai_rationale: Option<String>,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_secs,
            spotify_id: None,
            apple_music_id: None,
            youtube_music_id: None,
            is_instrumental: None,
            mood_tags: Vec::new(),
            ai_rationale: None,
        }
    }

    /// 某服务上的外部曲目 ID
    pub fn external_id(&self, service: MusicService) -> Option<&str> {
        match service {
            MusicService::Spotify => self.spotify_id.as_deref(),
            MusicService::AppleMusic => self.apple_music_id.as_deref(),
            MusicService::YoutubeMusic => self.youtube_music_id.as_deref(),
        }
    }

    pub fn set_external_id(&mut self, service: MusicService, id: impl Into<String>) {
        let id = id.into();
        match service {
            MusicService::Spotify => self.spotify_id = Some(id),
            MusicService::AppleMusic => self.apple_music_id = Some(id),
            MusicService::YoutubeMusic => self.youtube_music_id = Some(id),
        }
    }
}

/// Playlist 聚合根
///
/// 不变量:
/// - 曲目有序且非空
/// - total_duration 恒等于曲目时长之和（派生，随写入重算）
/// - 每个 UserBook 至多一个 is_active 歌单（由仓储事务保证）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    id: PlaylistId,
    user_book_id: Uuid,
    name: String,
    description: Option<String>,
    tracks: Vec<Track>,
    /// 总时长（秒），由曲目派生
    total_duration: u32,
    generated_at: DateTime<Utc>,
    /// 生成时使用的完整提示词（审计/复现用）
    generation_prompt: String,
    spotify_playlist_id: Option<String>,
    apple_music_playlist_id: Option<String>,
    youtube_music_playlist_id: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Playlist {
    /// 创建歌单（曲目不可为空）
    pub fn new(
        user_book_id: Uuid,
        name: impl Into<String>,
        description: Option<String>,
        tracks: Vec<Track>,
        generation_prompt: impl Into<String>,
    ) -> Result<Self, PlaylistError> {
        if tracks.is_empty() {
            return Err(PlaylistError::EmptyTrackList);
        }

        let now = Utc::now();
        let total_duration = derive_total_duration(&tracks);

        Ok(Self {
            id: PlaylistId::new(),
            user_book_id,
            name: name.into(),
            description,
            tracks,
            total_duration,
            generated_at: now,
            generation_prompt: generation_prompt.into(),
            spotify_playlist_id: None,
            apple_music_playlist_id: None,
            youtube_music_playlist_id: None,
            is_active: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// 某服务上的外部歌单 ID
    pub fn external_id(&self, service: MusicService) -> Option<&str> {
        match service {
            MusicService::Spotify => self.spotify_playlist_id.as_deref(),
            MusicService::AppleMusic => self.apple_music_playlist_id.as_deref(),
            MusicService::YoutubeMusic => self.youtube_music_playlist_id.as_deref(),
        }
    }

    /// 记录导出结果
    pub fn set_external_id(&mut self, service: MusicService, id: impl Into<String>) {
        let id = id.into();
        match service {
            MusicService::Spotify => self.spotify_playlist_id = Some(id),
            MusicService::AppleMusic => self.apple_music_playlist_id = Some(id),
            MusicService::YoutubeMusic => self.youtube_music_playlist_id = Some(id),
        }
        self.updated_at = Utc::now();
    }

    // Getters
    pub fn id(&self) -> &PlaylistId {
        &self.id
    }

    pub fn user_book_id(&self) -> &Uuid {
        &self.user_book_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn total_duration(&self) -> u32 {
        self.total_duration
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn generation_prompt(&self) -> &str {
        &self.generation_prompt
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// 总时长恒由曲目派生
fn derive_total_duration(tracks: &[Track]) -> u32 {
    tracks.iter().map(|t| t.duration_secs).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tracks() -> Vec<Track> {
        vec![
            Track::new("Nuvole Bianche", "Ludovico Einaudi", 344),
            Track::new("Una Mattina", "Ludovico Einaudi", 203),
        ]
    }

    #[test]
    fn test_empty_track_list_rejected() {
        let result = Playlist::new(Uuid::new_v4(), "Empty", None, vec![], "prompt");
        assert!(result.is_err());
    }

    #[test]
    fn test_total_duration_derived() {
        let playlist =
            Playlist::new(Uuid::new_v4(), "Quiet evening", None, sample_tracks(), "prompt")
                .unwrap();
        assert_eq!(playlist.total_duration(), 547);
    }

    #[test]
    fn test_new_playlist_inactive() {
        let playlist =
            Playlist::new(Uuid::new_v4(), "Quiet evening", None, sample_tracks(), "prompt")
                .unwrap();
        assert!(!playlist.is_active());
    }

    #[test]
    fn test_external_id_roundtrip() {
        let mut playlist =
            Playlist::new(Uuid::new_v4(), "Quiet evening", None, sample_tracks(), "prompt")
                .unwrap();

        assert!(playlist.external_id(MusicService::Spotify).is_none());
        playlist.set_external_id(MusicService::Spotify, "sp-list-1");
        assert_eq!(playlist.external_id(MusicService::Spotify), Some("sp-list-1"));
        assert!(playlist.external_id(MusicService::AppleMusic).is_none());
    }

    #[test]
    fn test_generation_prompt_recorded() {
        let playlist = Playlist::new(
            Uuid::new_v4(),
            "Quiet evening",
            None,
            sample_tracks(),
            "melancholic slow piano, 60 minutes",
        )
        .unwrap();
        assert_eq!(
            playlist.generation_prompt(),
            "melancholic slow piano, 60 minutes"
        );
    }
}
