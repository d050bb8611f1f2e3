//! User Commands

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::user::{ServiceDetail, UserPreferences};

/// 注册用户命令
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub email: String,
    pub display_name: String,
}

/// 更新用户偏好命令
#[derive(Debug, Clone)]
pub struct UpdatePreferences {
    pub user_id: Uuid,
    pub preferences: UserPreferences,
}

/// 连接外部服务命令（OAuth 流程外部完成，这里只存凭据）
#[derive(Debug, Clone)]
pub struct ConnectService {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub external_user_id: String,
    /// 服务类型及专属字段
    pub detail: ServiceDetail,
}

/// 断开外部服务命令
///
/// 已导出歌单的外部 ID 保留，后续导出将因无连接而失败
#[derive(Debug, Clone)]
pub struct DisconnectService {
    pub user_id: Uuid,
    /// "goodreads" / "spotify" / "apple-music" / "youtube-music"
    pub service: String,
}
