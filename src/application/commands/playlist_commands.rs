//! Playlist Commands

use uuid::Uuid;

/// 生成歌单命令（入队异步处理）
#[derive(Debug, Clone)]
pub struct GeneratePlaylist {
    pub user_book_id: Uuid,
    /// 已有分析时是否强制重新分析
    pub force_reanalyze: bool,
}

/// 激活歌单命令（同书架条目下互斥）
#[derive(Debug, Clone)]
pub struct ActivatePlaylist {
    pub playlist_id: Uuid,
}

/// 删除歌单命令
#[derive(Debug, Clone)]
pub struct DeletePlaylist {
    pub playlist_id: Uuid,
}
