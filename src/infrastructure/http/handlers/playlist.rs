//! Playlist Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{
    ActivatePlaylist, DeletePlaylist, ExportPlaylist, GeneratePlaylist,
};
use crate::application::queries::{GetPlaylist, ListPlaylists};
use crate::domain::user::MusicService;
use crate::infrastructure::http::dto::{
    ApiResponse, Empty, PlaylistResponse, TrackResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Generate
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub user_book_id: Uuid,
    #[serde(default)]
    pub force_reanalyze: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponseDto {
    pub job_id: String,
    pub user_book_id: Uuid,
}

pub async fn generate_playlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponseDto>>, ApiError> {
    let cmd = GeneratePlaylist {
        user_book_id: req.user_book_id,
        force_reanalyze: req.force_reanalyze,
    };

    let result = state.generate_playlist_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(GenerateResponseDto {
        job_id: result.job_id,
        user_book_id: result.user_book_id,
    })))
}

// ============================================================================
// List
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListPlaylistsRequest {
    pub user_book_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PlaylistsResponseDto {
    pub total: usize,
    pub playlists: Vec<PlaylistResponse>,
}

pub async fn list_playlists(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListPlaylistsRequest>,
) -> Result<Json<ApiResponse<PlaylistsResponseDto>>, ApiError> {
    let playlists = state
        .list_playlists_handler
        .handle(ListPlaylists {
            user_book_id: req.user_book_id,
        })
        .await?;

    let playlists: Vec<PlaylistResponse> =
        playlists.into_iter().map(PlaylistResponse::from).collect();

    Ok(Json(ApiResponse::success(PlaylistsResponseDto {
        total: playlists.len(),
        playlists,
    })))
}

// ============================================================================
// Get
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetPlaylistRequest {
    pub playlist_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PlaylistDetailsDto {
    #[serde(flatten)]
    pub playlist: PlaylistResponse,
    pub tracks: Vec<TrackResponse>,
}

pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetPlaylistRequest>,
) -> Result<Json<ApiResponse<PlaylistDetailsDto>>, ApiError> {
    let details = state
        .get_playlist_handler
        .handle(GetPlaylist {
            playlist_id: req.playlist_id,
        })
        .await?;

    let mut playlist: PlaylistResponse = details.playlist.into();
    playlist.track_count = Some(details.tracks.len());

    Ok(Json(ApiResponse::success(PlaylistDetailsDto {
        playlist,
        tracks: details.tracks.into_iter().map(TrackResponse::from).collect(),
    })))
}

// ============================================================================
// Activate / Delete
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub playlist_id: Uuid,
}

pub async fn activate_playlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .activate_playlist_handler
        .handle(ActivatePlaylist {
            playlist_id: req.playlist_id,
        })
        .await?;

    Ok(Json(ApiResponse::ok()))
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub playlist_id: Uuid,
}

pub async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .delete_playlist_handler
        .handle(DeletePlaylist {
            playlist_id: req.playlist_id,
        })
        .await?;

    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Export
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub playlist_id: Uuid,
    /// 缺省时使用用户默认音乐服务
    pub service: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponseDto {
    pub playlist_id: Uuid,
    pub service: String,
    pub external_playlist_id: String,
    pub matched: usize,
    pub unmatched: usize,
    pub created: bool,
}

pub async fn export_playlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> Result<Json<ApiResponse<ExportResponseDto>>, ApiError> {
    let service = req
        .service
        .as_deref()
        .map(|s| {
            MusicService::from_str(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown music service: {}", s)))
        })
        .transpose()?;

    let cmd = ExportPlaylist {
        playlist_id: req.playlist_id,
        service,
    };

    let result = state.export_playlist_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(ExportResponseDto {
        playlist_id: result.playlist_id,
        service: result.service.as_str().to_string(),
        external_playlist_id: result.external_playlist_id,
        matched: result.matched,
        unmatched: result.unmatched,
        created: result.created,
    })))
}
