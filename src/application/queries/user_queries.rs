//! User Queries

use uuid::Uuid;

/// 获取用户详情查询（含已连接服务）
#[derive(Debug, Clone)]
pub struct GetUser {
    pub user_id: Uuid,
}
