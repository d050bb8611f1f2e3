//! Library Context - Errors

use thiserror::Error;

use super::UserBookId;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("书架条目不存在: {0}")]
    NotFound(UserBookId),

    #[error("书籍已在书架中: {0}")]
    AlreadyInLibrary(UserBookId),

    #[error("无效的阅读状态: {0}")]
    InvalidStatus(String),

    #[error("无效的阅读进度: {0}（应在 0..=100）")]
    InvalidProgress(u8),

    #[error("存储错误: {0}")]
    StorageError(String),
}
