//! User Context - Aggregate Root
//!
//! User 持有外部服务连接（每种服务至多一个）与歌单生成偏好。
//! OAuth 授权流程不在本上下文内，令牌只存储和使用。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserError;

/// 邮箱
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> Result<Self, UserError> {
        let email = email.into().trim().to_lowercase();
        // 只做最小校验，完整校验交给注册入口
        if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@')
        {
            return Err(UserError::InvalidEmail(email));
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 外部音乐服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MusicService {
    Spotify,
    AppleMusic,
    YoutubeMusic,
}

impl MusicService {
    pub fn as_str(&self) -> &'static str {
        match self {
            MusicService::Spotify => "spotify",
            MusicService::AppleMusic => "apple-music",
            MusicService::YoutubeMusic => "youtube-music",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "spotify" => Some(MusicService::Spotify),
            "apple-music" => Some(MusicService::AppleMusic),
            "youtube-music" => Some(MusicService::YoutubeMusic),
            _ => None,
        }
    }

    pub fn all() -> [MusicService; 3] {
        [
            MusicService::Spotify,
            MusicService::AppleMusic,
            MusicService::YoutubeMusic,
        ]
    }
}

impl std::fmt::Display for MusicService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 歌单时长档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaylistLength {
    /// 约 30 分钟
    Short,
    /// 约 1 小时
    Medium,
    /// 约 2 小时
    Long,
}

impl PlaylistLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistLength::Short => "short",
            PlaylistLength::Medium => "medium",
            PlaylistLength::Long => "long",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "short" => Some(PlaylistLength::Short),
            "medium" => Some(PlaylistLength::Medium),
            "long" => Some(PlaylistLength::Long),
            _ => None,
        }
    }

    /// 目标时长（秒）
    pub fn target_secs(&self) -> u32 {
        match self {
            PlaylistLength::Short => 30 * 60,
            PlaylistLength::Medium => 60 * 60,
            PlaylistLength::Long => 120 * 60,
        }
    }
}

/// 用户偏好
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// 默认导出的音乐服务
    pub default_music_service: Option<MusicService>,
    /// 状态变更时自动生成歌单
    pub auto_generate_playlists: bool,
    /// 只选纯音乐
    pub instrumental_only: bool,
    /// 目标歌单时长档位
    pub playlist_length: PlaylistLength,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_music_service: None,
            auto_generate_playlists: false,
            instrumental_only: false,
            playlist_length: PlaylistLength::Medium,
        }
    }
}

/// 服务专属字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "kebab-case")]
pub enum ServiceDetail {
    Goodreads { username: String },
    Spotify { display_name: String },
    AppleMusic { storefront_id: String },
    YoutubeMusic { channel_id: String },
}

impl ServiceDetail {
    /// 持久化用的服务名
    pub fn service_name(&self) -> &'static str {
        match self {
            ServiceDetail::Goodreads { .. } => "goodreads",
            ServiceDetail::Spotify { .. } => "spotify",
            ServiceDetail::AppleMusic { .. } => "apple-music",
            ServiceDetail::YoutubeMusic { .. } => "youtube-music",
        }
    }

    /// 服务专属字段的值
    pub fn value(&self) -> &str {
        match self {
            ServiceDetail::Goodreads { username } => username,
            ServiceDetail::Spotify { display_name } => display_name,
            ServiceDetail::AppleMusic { storefront_id } => storefront_id,
            ServiceDetail::YoutubeMusic { channel_id } => channel_id,
        }
    }

    /// 由服务名和字段值重建
    pub fn from_parts(service: &str, value: String) -> Option<Self> {
        match service {
            "goodreads" => Some(ServiceDetail::Goodreads { username: value }),
            "spotify" => Some(ServiceDetail::Spotify {
                display_name: value,
            }),
            "apple-music" => Some(ServiceDetail::AppleMusic {
                storefront_id: value,
            }),
            "youtube-music" => Some(ServiceDetail::YoutubeMusic { channel_id: value }),
            _ => None,
        }
    }
}

/// 外部服务连接（OAuth 凭据存储）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConnection {
    pub connected_at: DateTime<Utc>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// 外部服务中的用户 ID
    pub external_user_id: String,
    pub detail: ServiceDetail,
}

impl ServiceConnection {
    /// 凭据是否已过期（expires_at 为空视为长期有效）
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// 已连接服务集合
///
/// 每种外部服务至多一个连接（结构上保证）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectedServices {
    pub goodreads: Option<ServiceConnection>,
    pub spotify: Option<ServiceConnection>,
    pub apple_music: Option<ServiceConnection>,
    pub youtube_music: Option<ServiceConnection>,
}

impl ConnectedServices {
    /// 按音乐服务取连接
    pub fn music_connection(&self, service: MusicService) -> Option<&ServiceConnection> {
        match service {
            MusicService::Spotify => self.spotify.as_ref(),
            MusicService::AppleMusic => self.apple_music.as_ref(),
            MusicService::YoutubeMusic => self.youtube_music.as_ref(),
        }
    }

    /// 替换某音乐服务的连接（返回旧连接）
    pub fn set_music_connection(
        &mut self,
        service: MusicService,
        connection: ServiceConnection,
    ) -> Option<ServiceConnection> {
        let slot = match service {
            MusicService::Spotify => &mut self.spotify,
            MusicService::AppleMusic => &mut self.apple_music,
            MusicService::YoutubeMusic => &mut self.youtube_music,
        };
        slot.replace(connection)
    }

    /// 断开某音乐服务（返回被移除的连接）
    pub fn remove_music_connection(&mut self, service: MusicService) -> Option<ServiceConnection> {
        let slot = match service {
            MusicService::Spotify => &mut self.spotify,
            MusicService::AppleMusic => &mut self.apple_music,
            MusicService::YoutubeMusic => &mut self.youtube_music,
        };
        slot.take()
    }
}

/// User 聚合根
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: Uuid,
    email: Email,
    display_name: String,
    connected_services: ConnectedServices,
    preferences: UserPreferences,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: Email, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            display_name: display_name.into(),
            connected_services: ConnectedServices::default(),
            preferences: UserPreferences::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_preferences(&mut self, preferences: UserPreferences) {
        self.preferences = preferences;
        self.updated_at = Utc::now();
    }

    pub fn connect_music_service(
        &mut self,
        service: MusicService,
        connection: ServiceConnection,
    ) -> Option<ServiceConnection> {
        let old = self
            .connected_services
            .set_music_connection(service, connection);
        self.updated_at = Utc::now();
        old
    }

    pub fn disconnect_music_service(
        &mut self,
        service: MusicService,
    ) -> Result<ServiceConnection, UserError> {
        let removed = self
            .connected_services
            .remove_music_connection(service)
            .ok_or(UserError::ServiceNotConnected(service))?;
        self.updated_at = Utc::now();
        Ok(removed)
    }

    // Getters
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn connected_services(&self) -> &ConnectedServices {
        &self.connected_services
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spotify_connection() -> ServiceConnection {
        ServiceConnection {
            connected_at: Utc::now(),
            access_token: "at-1".to_string(),
            refresh_token: Some("rt-1".to_string()),
            expires_at: None,
            external_user_id: "spotify-user".to_string(),
            detail: ServiceDetail::Spotify {
                display_name: "listener".to_string(),
            },
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(Email::new("reader@example.com").is_ok());
        assert!(Email::new("no-at-sign").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("reader@").is_err());
    }

    #[test]
    fn test_email_normalized() {
        let email = Email::new("  Reader@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "reader@example.com");
    }

    #[test]
    fn test_length_targets() {
        assert_eq!(PlaylistLength::Short.target_secs(), 1800);
        assert_eq!(PlaylistLength::Medium.target_secs(), 3600);
        assert_eq!(PlaylistLength::Long.target_secs(), 7200);
    }

    #[test]
    fn test_connect_replaces_existing() {
        let mut user = User::new(Email::new("a@b.c").unwrap(), "Reader");
        assert!(user
            .connect_music_service(MusicService::Spotify, spotify_connection())
            .is_none());

        let mut second = spotify_connection();
        second.access_token = "at-2".to_string();
        let old = user
            .connect_music_service(MusicService::Spotify, second)
            .unwrap();
        assert_eq!(old.access_token, "at-1");
    }

    #[test]
    fn test_disconnect_missing_service() {
        let mut user = User::new(Email::new("a@b.c").unwrap(), "Reader");
        assert!(user.disconnect_music_service(MusicService::AppleMusic).is_err());
    }

    #[test]
    fn test_connection_expiry() {
        let mut conn = spotify_connection();
        assert!(!conn.is_expired(Utc::now()));

        conn.expires_at = Some(Utc::now() - chrono::Duration::minutes(5));
        assert!(conn.is_expired(Utc::now()));

        conn.expires_at = Some(Utc::now() + chrono::Duration::minutes(5));
        assert!(!conn.is_expired(Utc::now()));
    }
}
