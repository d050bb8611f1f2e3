//! Library Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{
    AddBookToLibrary, RemoveBookFromLibrary, UpdateReadingStatus,
};
use crate::application::queries::{GetLibrary, GetUserBook};
use crate::domain::book::BookSource;
use crate::domain::library::ReadingStatus;
use crate::infrastructure::http::dto::{
    AnalysisResponse, ApiResponse, BookResponse, Empty, PlaylistResponse, UserBookResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Add
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub source: String,
    pub external_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddBookResponseDto {
    pub user_book_id: Uuid,
    pub book_id: Uuid,
    pub book_deduplicated: bool,
}

pub async fn add_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddBookRequest>,
) -> Result<Json<ApiResponse<AddBookResponseDto>>, ApiError> {
    let source = BookSource::from_str(&req.source)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown book source: {}", req.source)))?;

    let cmd = AddBookToLibrary {
        user_id: req.user_id,
        title: req.title,
        authors: req.authors,
        description: req.description,
        cover_image_url: req.cover_image_url,
        genres: req.genres,
        source,
        external_id: req.external_id,
    };

    let result = state.add_book_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(AddBookResponseDto {
        user_book_id: result.user_book_id,
        book_id: result.book_id,
        book_deduplicated: result.book_deduplicated,
    })))
}

// ============================================================================
// List
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListLibraryRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LibraryEntryDto {
    pub user_book: UserBookResponse,
    pub book: BookResponse,
}

#[derive(Debug, Serialize)]
pub struct LibraryResponseDto {
    pub total: usize,
    pub entries: Vec<LibraryEntryDto>,
}

pub async fn list_library(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListLibraryRequest>,
) -> Result<Json<ApiResponse<LibraryResponseDto>>, ApiError> {
    let entries = state
        .get_library_handler
        .handle(GetLibrary {
            user_id: req.user_id,
        })
        .await?;

    let entries: Vec<LibraryEntryDto> = entries
        .into_iter()
        .map(|entry| LibraryEntryDto {
            user_book: entry.user_book.into(),
            book: entry.book.into(),
        })
        .collect();

    Ok(Json(ApiResponse::success(LibraryResponseDto {
        total: entries.len(),
        entries,
    })))
}

// ============================================================================
// Get
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetUserBookRequest {
    pub user_book_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UserBookDetailsDto {
    pub user_book: UserBookResponse,
    pub book: BookResponse,
    pub analysis: Option<AnalysisResponse>,
    pub playlists: Vec<PlaylistResponse>,
}

pub async fn get_user_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetUserBookRequest>,
) -> Result<Json<ApiResponse<UserBookDetailsDto>>, ApiError> {
    let details = state
        .get_user_book_handler
        .handle(GetUserBook {
            user_book_id: req.user_book_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(UserBookDetailsDto {
        user_book: details.user_book.into(),
        book: details.book.into(),
        analysis: details.analysis.map(AnalysisResponse::from),
        playlists: details
            .playlists
            .into_iter()
            .map(PlaylistResponse::from)
            .collect(),
    })))
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub user_book_id: Uuid,
    pub status: String,
    pub progress: Option<u8>,
    pub current_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponseDto {
    pub user_book_id: Uuid,
    pub status: String,
    /// 本次变更触发的自动生成任务（未触发为 null）
    pub generation_job_id: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<UpdateStatusResponseDto>>, ApiError> {
    let status = ReadingStatus::from_str(&req.status)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown reading status: {}", req.status)))?;

    let cmd = UpdateReadingStatus {
        user_book_id: req.user_book_id,
        status,
        progress: req.progress,
        current_page: req.current_page,
    };

    let result = state.update_status_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(UpdateStatusResponseDto {
        user_book_id: result.user_book_id,
        status: result.status.as_str().to_string(),
        generation_job_id: result.generation_job_id,
    })))
}

// ============================================================================
// Remove
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RemoveBookRequest {
    pub user_book_id: Uuid,
}

pub async fn remove_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RemoveBookRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let cmd = RemoveBookFromLibrary {
        user_book_id: req.user_book_id,
    };

    state.remove_book_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::ok()))
}
