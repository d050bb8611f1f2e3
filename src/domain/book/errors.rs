//! Book Context - Errors

use thiserror::Error;

use super::BookId;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("书籍不存在: {0}")]
    NotFound(BookId),

    #[error("书籍已存在: {0}")]
    AlreadyExists(BookId),

    #[error("无效的书名: {0}")]
    InvalidTitle(String),

    #[error("无效的来源: {0}")]
    InvalidSource(String),

    #[error("存储错误: {0}")]
    StorageError(String),
}
