//! User Context - Errors

use thiserror::Error;
use uuid::Uuid;

use super::MusicService;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("用户不存在: {0}")]
    NotFound(Uuid),

    #[error("邮箱已被注册: {0}")]
    EmailTaken(String),

    #[error("无效的邮箱: {0}")]
    InvalidEmail(String),

    #[error("服务未连接: {0}")]
    ServiceNotConnected(MusicService),

    #[error("服务凭据已过期: {0}")]
    ConnectionExpired(MusicService),

    #[error("存储错误: {0}")]
    StorageError(String),
}
