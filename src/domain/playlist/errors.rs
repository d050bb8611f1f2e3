//! Playlist Context - Errors

use thiserror::Error;

use super::PlaylistId;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("歌单不存在: {0}")]
    NotFound(PlaylistId),

    #[error("歌单曲目不能为空")]
    EmptyTrackList,

    #[error("候选曲目不足以达到目标时长（已选 {achieved_secs} 秒，下界 {required_secs} 秒）")]
    DurationUnreachable {
        achieved_secs: u32,
        required_secs: u32,
    },

    #[error("存储错误: {0}")]
    StorageError(String),
}
