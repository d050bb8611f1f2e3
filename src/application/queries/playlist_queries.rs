//! Playlist Queries

use uuid::Uuid;

/// 列出书架条目的歌单查询
#[derive(Debug, Clone)]
pub struct ListPlaylists {
    pub user_book_id: Uuid,
}

/// 获取歌单详情查询（含曲目）
#[derive(Debug, Clone)]
pub struct GetPlaylist {
    pub playlist_id: Uuid,
}
