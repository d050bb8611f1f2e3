//! User Handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{
    ConnectService, DisconnectService, RegisterUser, UpdatePreferences,
};
use crate::application::queries::GetUser;
use crate::domain::user::{ServiceDetail, UserPreferences};
use crate::infrastructure::http::dto::{
    ApiResponse, ConnectionResponse, Empty, UserResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Register
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponseDto {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResponseDto>>, ApiError> {
    let cmd = RegisterUser {
        email: req.email,
        display_name: req.display_name,
    };

    let result = state.register_user_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(RegisterResponseDto {
        id: result.id,
        email: result.email,
        display_name: result.display_name,
    })))
}

// ============================================================================
// Get
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetUserRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UserDetailsDto {
    #[serde(flatten)]
    pub user: UserResponse,
    pub connections: Vec<ConnectionResponse>,
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetUserRequest>,
) -> Result<Json<ApiResponse<UserDetailsDto>>, ApiError> {
    let details = state
        .get_user_handler
        .handle(GetUser {
            user_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(UserDetailsDto {
        user: details.user.into(),
        connections: details
            .connections
            .into_iter()
            .map(ConnectionResponse::from)
            .collect(),
    })))
}

// ============================================================================
// Preferences
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub user_id: Uuid,
    pub preferences: UserPreferences,
}

pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let cmd = UpdatePreferences {
        user_id: req.user_id,
        preferences: req.preferences,
    };

    state.update_preferences_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Connect / Disconnect
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ConnectServiceRequest {
    pub user_id: Uuid,
    /// "goodreads" / "spotify" / "apple-music" / "youtube-music"
    pub service: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub external_user_id: String,
    /// 服务专属字段（用户名/显示名/storefront/频道 ID）
    pub detail_value: String,
}

pub async fn connect_service(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConnectServiceRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let detail = ServiceDetail::from_parts(&req.service, req.detail_value)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown service: {}", req.service)))?;

    let cmd = ConnectService {
        user_id: req.user_id,
        access_token: req.access_token,
        refresh_token: req.refresh_token,
        expires_at: req.expires_at,
        external_user_id: req.external_user_id,
        detail,
    };

    state.connect_service_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::ok()))
}

#[derive(Debug, Deserialize)]
pub struct DisconnectServiceRequest {
    pub user_id: Uuid,
    pub service: String,
}

/// 支持断开的服务名
const KNOWN_SERVICES: &[&str] = &["goodreads", "spotify", "apple-music", "youtube-music"];

pub async fn disconnect_service(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DisconnectServiceRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    if !KNOWN_SERVICES.contains(&req.service.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unknown service: {}",
            req.service
        )));
    }

    let cmd = DisconnectService {
        user_id: req.user_id,
        service: req.service,
    };

    state.disconnect_service_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::ok()))
}
