//! User Command Handlers

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{
    ConnectService, DisconnectService, RegisterUser, UpdatePreferences,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{ServiceConnectionRecord, UserRecord, UserRepositoryPort};
use crate::domain::user::{Email, UserPreferences};

// ============================================================================
// RegisterUser
// ============================================================================

/// 注册用户响应
#[derive(Debug, Clone)]
pub struct RegisterUserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// RegisterUser Handler
pub struct RegisterUserHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
}

impl RegisterUserHandler {
    pub fn new(user_repo: Arc<dyn UserRepositoryPort>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(
        &self,
        command: RegisterUser,
    ) -> Result<RegisterUserResponse, ApplicationError> {
        let email = Email::new(command.email)
            .map_err(|e| ApplicationError::validation(e.to_string()))?;

        if self.user_repo.find_by_email(email.as_str()).await?.is_some() {
            return Err(ApplicationError::business_rule(format!(
                "Email already registered: {}",
                email
            )));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: email.as_str().to_string(),
            display_name: command.display_name,
            preferences: UserPreferences::default(),
            created_at: now,
            updated_at: now,
        };

        self.user_repo.save(&user).await?;

        tracing::info!(user_id = %user.id, email = %user.email, "User registered");

        Ok(RegisterUserResponse {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
        })
    }
}

// ============================================================================
// UpdatePreferences
// ============================================================================

/// UpdatePreferences Handler
pub struct UpdatePreferencesHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
}

impl UpdatePreferencesHandler {
    pub fn new(user_repo: Arc<dyn UserRepositoryPort>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, command: UpdatePreferences) -> Result<(), ApplicationError> {
        let user = self
            .user_repo
            .find_by_id(command.user_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("User", command.user_id))?;

        self.user_repo
            .update_preferences(user.id, &command.preferences)
            .await?;

        tracing::info!(user_id = %user.id, "Preferences updated");
        Ok(())
    }
}

// ============================================================================
// ConnectService
// ============================================================================

/// ConnectService Handler - 存储外部服务凭据
pub struct ConnectServiceHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
}

impl ConnectServiceHandler {
    pub fn new(user_repo: Arc<dyn UserRepositoryPort>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, command: ConnectService) -> Result<(), ApplicationError> {
        let user = self
            .user_repo
            .find_by_id(command.user_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("User", command.user_id))?;

        if command.access_token.trim().is_empty() {
            return Err(ApplicationError::validation("Access token cannot be empty"));
        }

        let service = command.detail.service_name();
        let connection = ServiceConnectionRecord {
            id: Uuid::new_v4(),
            user_id: user.id,
            service: service.to_string(),
            connected_at: Utc::now(),
            access_token: command.access_token,
            refresh_token: command.refresh_token,
            expires_at: command.expires_at,
            external_user_id: command.external_user_id,
            detail_value: command.detail.value().to_string(),
        };

        // 同用户同服务覆盖旧连接
        self.user_repo.save_connection(&connection).await?;

        tracing::info!(
            user_id = %user.id,
            service = %service,
            "Service connected"
        );
        Ok(())
    }
}

// ============================================================================
// DisconnectService
// ============================================================================

/// DisconnectService Handler
///
/// 已导出歌单的外部 ID 不回收，仅移除凭据
pub struct DisconnectServiceHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
}

impl DisconnectServiceHandler {
    pub fn new(user_repo: Arc<dyn UserRepositoryPort>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, command: DisconnectService) -> Result<(), ApplicationError> {
        let existed = self
            .user_repo
            .delete_connection(command.user_id, &command.service)
            .await?;

        if !existed {
            return Err(ApplicationError::business_rule(format!(
                "Service not connected: {}",
                command.service
            )));
        }

        tracing::info!(
            user_id = %command.user_id,
            service = %command.service,
            "Service disconnected"
        );
        Ok(())
    }
}
