//! Library Commands

use uuid::Uuid;

use crate::domain::book::BookSource;
use crate::domain::library::ReadingStatus;

/// 加书入架命令（书籍按 (source, external_id) 去重）
#[derive(Debug, Clone)]
pub struct AddBookToLibrary {
    pub user_id: Uuid,
    pub title: String,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub genres: Vec<String>,
    pub source: BookSource,
    pub external_id: Option<String>,
}

/// 更新阅读状态命令
#[derive(Debug, Clone)]
pub struct UpdateReadingStatus {
    pub user_book_id: Uuid,
    pub status: ReadingStatus,
    pub progress: Option<u8>,
    pub current_page: Option<u32>,
}

/// 移出书架命令（级联删除分析与歌单）
#[derive(Debug, Clone)]
pub struct RemoveBookFromLibrary {
    pub user_book_id: Uuid,
}
