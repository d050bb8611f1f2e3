//! Playlist Command Handlers

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{ActivatePlaylist, DeletePlaylist, GeneratePlaylist};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    GenerationJob, JobManagerPort, LibraryRepositoryPort, PlaylistRepositoryPort,
};

// ============================================================================
// GeneratePlaylist
// ============================================================================

/// 生成歌单响应（任务已入队，结果通过 WS 事件/任务查询获取）
#[derive(Debug, Clone)]
pub struct GeneratePlaylistResponse {
    pub job_id: String,
    pub user_book_id: Uuid,
}

/// GeneratePlaylist Handler - 入队生成任务
pub struct GeneratePlaylistHandler {
    library_repo: Arc<dyn LibraryRepositoryPort>,
    job_manager: Arc<dyn JobManagerPort>,
}

impl GeneratePlaylistHandler {
    pub fn new(
        library_repo: Arc<dyn LibraryRepositoryPort>,
        job_manager: Arc<dyn JobManagerPort>,
    ) -> Self {
        Self {
            library_repo,
            job_manager,
        }
    }

    pub async fn handle(
        &self,
        command: GeneratePlaylist,
    ) -> Result<GeneratePlaylistResponse, ApplicationError> {
        let user_book = self
            .library_repo
            .find_by_id(command.user_book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("UserBook", command.user_book_id))?;

        let job = GenerationJob::new(user_book.user_id, user_book.id, command.force_reanalyze);
        let job_id = self.job_manager.submit(job)?;

        tracing::info!(
            user_book_id = %user_book.id,
            job_id = %job_id,
            force_reanalyze = command.force_reanalyze,
            "Generation job submitted"
        );

        Ok(GeneratePlaylistResponse {
            job_id,
            user_book_id: user_book.id,
        })
    }
}

// ============================================================================
// ActivatePlaylist
// ============================================================================

/// ActivatePlaylist Handler
///
/// 互斥不变量（同 user_book 至多一个 active）由仓储单事务保证
pub struct ActivatePlaylistHandler {
    playlist_repo: Arc<dyn PlaylistRepositoryPort>,
}

impl ActivatePlaylistHandler {
    pub fn new(playlist_repo: Arc<dyn PlaylistRepositoryPort>) -> Self {
        Self { playlist_repo }
    }

    pub async fn handle(&self, command: ActivatePlaylist) -> Result<(), ApplicationError> {
        let playlist = self
            .playlist_repo
            .find_by_id(command.playlist_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Playlist", command.playlist_id))?;

        self.playlist_repo
            .activate(playlist.user_book_id, playlist.id)
            .await?;

        tracing::info!(
            playlist_id = %playlist.id,
            user_book_id = %playlist.user_book_id,
            "Playlist activated"
        );
        Ok(())
    }
}

// ============================================================================
// DeletePlaylist
// ============================================================================

/// DeletePlaylist Handler
pub struct DeletePlaylistHandler {
    playlist_repo: Arc<dyn PlaylistRepositoryPort>,
}

impl DeletePlaylistHandler {
    pub fn new(playlist_repo: Arc<dyn PlaylistRepositoryPort>) -> Self {
        Self { playlist_repo }
    }

    pub async fn handle(&self, command: DeletePlaylist) -> Result<(), ApplicationError> {
        let playlist = self
            .playlist_repo
            .find_by_id(command.playlist_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Playlist", command.playlist_id))?;

        self.playlist_repo.delete(playlist.id).await?;

        tracing::info!(playlist_id = %playlist.id, "Playlist deleted");
        Ok(())
    }
}
