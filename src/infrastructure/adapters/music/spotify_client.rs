//! Spotify Catalog Client
//!
//! Spotify Web API:
//! - GET  /v1/search?q=...&type=track
//! - POST /v1/users/{user_id}/playlists
//! - PUT  /v1/playlists/{playlist_id}/tracks

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{error_from_reqwest, error_from_response, infer_instrumental};
use crate::application::ports::{CatalogError, CatalogTrack, MusicCatalogPort};
use crate::domain::user::MusicService;

/// Spotify 客户端配置
#[derive(Debug, Clone)]
pub struct SpotifyClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for SpotifyClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spotify.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

// ---- Search 响应 ----

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchTracks,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: String,
    name: String,
    duration_ms: u64,
    artists: Vec<SpotifyArtist>,
    album: Option<SpotifyAlbum>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    name: String,
}

// ---- Playlist 请求/响应 ----

#[derive(Debug, Serialize)]
struct CreatePlaylistRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    public: bool,
}

#[derive(Debug, Deserialize)]
struct CreatePlaylistResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct ReplaceTracksRequest {
    uris: Vec<String>,
}

/// Spotify 曲库客户端
pub struct SpotifyClient {
    client: Client,
    config: SpotifyClientConfig,
}

impl SpotifyClient {
    pub fn new(config: SpotifyClientConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn with_default_config() -> Result<Self, CatalogError> {
        Self::new(SpotifyClientConfig::default())
    }

    fn track_uri(track_id: &str) -> String {
        format!("spotify:track:{}", track_id)
    }
}

#[async_trait]
impl MusicCatalogPort for SpotifyClient {
    fn service(&self) -> MusicService {
        MusicService::Spotify
    }

    async fn search_tracks(
        &self,
        access_token: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogError> {
        let url = format!("{}/search", self.config.base_url);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("q", query),
                ("type", "track"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(error_from_reqwest)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        let tracks = body
            .tracks
            .items
            .into_iter()
            .map(|t| CatalogTrack {
                is_instrumental: infer_instrumental(&t.name),
                duration_secs: (t.duration_ms / 1000) as u32,
                artist: t
                    .artists
                    .first()
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
                album: t.album.map(|a| a.name),
                external_id: t.id,
                title: t.name,
            })
            .collect();

        Ok(tracks)
    }

    async fn create_playlist(
        &self,
        access_token: &str,
        external_user_id: &str,
        name: &str,
        description: Option<&str>,
        track_ids: &[String],
    ) -> Result<String, CatalogError> {
        let url = format!("{}/users/{}/playlists", self.config.base_url, external_user_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&CreatePlaylistRequest {
                name,
                description,
                public: false,
            })
            .send()
            .await
            .map_err(error_from_reqwest)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let created: CreatePlaylistResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        // 创建后填充曲目
        self.replace_tracks(access_token, &created.id, track_ids)
            .await?;

        tracing::info!(
            playlist_id = %created.id,
            track_count = track_ids.len(),
            "Spotify playlist created"
        );

        Ok(created.id)
    }

    async fn replace_tracks(
        &self,
        access_token: &str,
        external_playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        let url = format!(
            "{}/playlists/{}/tracks",
            self.config.base_url, external_playlist_id
        );

        let uris: Vec<String> = track_ids.iter().map(|id| Self::track_uri(id)).collect();

        let response = self
            .client
            .put(&url)
            .bearer_auth(access_token)
            .json(&ReplaceTracksRequest { uris })
            .send()
            .await
            .map_err(error_from_reqwest)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_uri() {
        assert_eq!(SpotifyClient::track_uri("abc123"), "spotify:track:abc123");
    }

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{
            "tracks": {
                "items": [{
                    "id": "t1",
                    "name": "Nuvole Bianche",
                    "duration_ms": 344000,
                    "artists": [{"name": "Ludovico Einaudi"}],
                    "album": {"name": "Una Mattina"}
                }]
            }
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.tracks.items.len(), 1);
        assert_eq!(parsed.tracks.items[0].duration_ms, 344000);
    }
}
