//! User Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{ServiceConnectionRecord, UserRecord, UserRepositoryPort};
use crate::application::queries::GetUser;

/// 用户详情（含已连接服务）
#[derive(Debug, Clone)]
pub struct UserDetails {
    pub user: UserRecord,
    pub connections: Vec<ServiceConnectionRecord>,
}

/// GetUser Handler
pub struct GetUserHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
}

impl GetUserHandler {
    pub fn new(user_repo: Arc<dyn UserRepositoryPort>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, query: GetUser) -> Result<UserDetails, ApplicationError> {
        let user = self
            .user_repo
            .find_by_id(query.user_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("User", query.user_id))?;

        let connections = self.user_repo.find_connections(user.id).await?;

        Ok(UserDetails { user, connections })
    }
}
