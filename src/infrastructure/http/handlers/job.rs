//! Job Handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::application::queries::GetJobStatus;
use crate::infrastructure::http::dto::{ApiResponse, JobResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobStatusRequest {
    pub job_id: String,
}

pub async fn query_job_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JobStatusRequest>,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    let job = state
        .get_job_status_handler
        .handle(GetJobStatus { job_id: req.job_id })?;

    Ok(Json(ApiResponse::success(job.into())))
}
