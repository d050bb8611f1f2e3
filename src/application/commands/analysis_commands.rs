//! Analysis Commands

use uuid::Uuid;

/// 请求书籍分析命令
///
/// 同一 (user_book, model) 的重复请求幂等返回已有分析，
/// 除非 force 置位。
#[derive(Debug, Clone)]
pub struct RequestAnalysis {
    pub user_book_id: Uuid,
    /// 可选全文（给出时产出 full-content 分析）
    pub full_text: Option<String>,
    pub force: bool,
}
