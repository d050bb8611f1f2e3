//! User Context - 用户偏好与外部服务连接上下文

mod aggregate;
mod errors;

pub use aggregate::{
    ConnectedServices, Email, MusicService, PlaylistLength, ServiceConnection, ServiceDetail,
    User, UserPreferences,
};
pub use errors::UserError;
