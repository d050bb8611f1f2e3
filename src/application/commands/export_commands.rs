//! Export Commands

use uuid::Uuid;

use crate::domain::user::MusicService;

/// 导出歌单命令
///
/// service 缺省时使用用户偏好中的默认音乐服务。
/// 重复导出幂等：已有外部歌单时整体替换曲目而不是新建。
#[derive(Debug, Clone)]
pub struct ExportPlaylist {
    pub playlist_id: Uuid,
    pub service: Option<MusicService>,
}
