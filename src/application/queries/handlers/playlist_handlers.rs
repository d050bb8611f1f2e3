//! Playlist Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{PlaylistRecord, PlaylistRepositoryPort, TrackRecord};
use crate::application::queries::{GetPlaylist, ListPlaylists};

/// 歌单详情（含曲目）
#[derive(Debug, Clone)]
pub struct PlaylistDetails {
    pub playlist: PlaylistRecord,
    pub tracks: Vec<TrackRecord>,
}

/// ListPlaylists Handler
pub struct ListPlaylistsHandler {
    playlist_repo: Arc<dyn PlaylistRepositoryPort>,
}

impl ListPlaylistsHandler {
    pub fn new(playlist_repo: Arc<dyn PlaylistRepositoryPort>) -> Self {
        Self { playlist_repo }
    }

    pub async fn handle(
        &self,
        query: ListPlaylists,
    ) -> Result<Vec<PlaylistRecord>, ApplicationError> {
        Ok(self
            .playlist_repo
            .find_by_user_book(query.user_book_id)
            .await?)
    }
}

/// GetPlaylist Handler
pub struct GetPlaylistHandler {
    playlist_repo: Arc<dyn PlaylistRepositoryPort>,
}

impl GetPlaylistHandler {
    pub fn new(playlist_repo: Arc<dyn PlaylistRepositoryPort>) -> Self {
        Self { playlist_repo }
    }

    pub async fn handle(&self, query: GetPlaylist) -> Result<PlaylistDetails, ApplicationError> {
        let playlist = self
            .playlist_repo
            .find_by_id(query.playlist_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Playlist", query.playlist_id))?;

        let tracks = self.playlist_repo.find_tracks(playlist.id).await?;

        Ok(PlaylistDetails { playlist, tracks })
    }
}
