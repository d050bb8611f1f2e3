//! Analysis Handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::RequestAnalysis;
use crate::application::queries::GetAnalysis;
use crate::infrastructure::http::dto::{AnalysisResponse, ApiResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RequestAnalysisRequest {
    pub user_book_id: Uuid,
    /// 可选全文，给出时产出 full-content 分析
    pub full_text: Option<String>,
    #[serde(default)]
    pub force: bool,
}

pub async fn request_analysis(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RequestAnalysisRequest>,
) -> Result<Json<ApiResponse<AnalysisResponse>>, ApiError> {
    let cmd = RequestAnalysis {
        user_book_id: req.user_book_id,
        full_text: req.full_text,
        force: req.force,
    };

    let record = state.request_analysis_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(record.into())))
}

// ============================================================================
// Get
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetAnalysisRequest {
    pub user_book_id: Uuid,
}

pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetAnalysisRequest>,
) -> Result<Json<ApiResponse<AnalysisResponse>>, ApiError> {
    let record = state
        .get_analysis_handler
        .handle(GetAnalysis {
            user_book_id: req.user_book_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(record.into())))
}
