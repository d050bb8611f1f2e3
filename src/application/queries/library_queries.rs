//! Library Queries

use uuid::Uuid;

/// 获取用户书架查询
#[derive(Debug, Clone)]
pub struct GetLibrary {
    pub user_id: Uuid,
}

/// 获取书架条目详情查询（含书籍、分析、歌单）
#[derive(Debug, Clone)]
pub struct GetUserBook {
    pub user_book_id: Uuid,
}

/// 获取分析结果查询
#[derive(Debug, Clone)]
pub struct GetAnalysis {
    pub user_book_id: Uuid,
}
