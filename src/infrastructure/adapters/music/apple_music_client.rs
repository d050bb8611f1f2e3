//! Apple Music Catalog Client
//!
//! Apple Music API:
//! - GET  /v1/catalog/{storefront}/search?types=songs
//! - POST /v1/me/library/playlists
//! - PUT  /v1/me/library/playlists/{id}/tracks
//!
//! 鉴权：Authorization 为开发者令牌，Music-User-Token 为用户令牌

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{error_from_reqwest, error_from_response, infer_instrumental};
use crate::application::ports::{CatalogError, CatalogTrack, MusicCatalogPort};
use crate::domain::user::MusicService;

/// Apple Music 客户端配置
#[derive(Debug, Clone)]
pub struct AppleMusicClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// 开发者令牌（JWT）
    pub developer_token: String,
    /// 缺省 storefront
    pub storefront: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for AppleMusicClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.music.apple.com/v1".to_string(),
            developer_token: String::new(),
            storefront: "us".to_string(),
            timeout_secs: 30,
        }
    }
}

// ---- Search 响应 ----

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    songs: Option<SongsPage>,
}

#[derive(Debug, Deserialize)]
struct SongsPage {
    data: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct Song {
    id: String,
    attributes: SongAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SongAttributes {
    name: String,
    artist_name: String,
    album_name: Option<String>,
    duration_in_millis: u64,
}

// ---- Playlist 请求/响应 ----

#[derive(Debug, Serialize)]
struct CreatePlaylistRequest<'a> {
    attributes: PlaylistAttributes<'a>,
    relationships: PlaylistRelationships,
}

#[derive(Debug, Serialize)]
struct PlaylistAttributes<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PlaylistRelationships {
    tracks: TracksRelationship,
}

#[derive(Debug, Serialize)]
struct TracksRelationship {
    data: Vec<TrackRef>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrackRef {
    id: String,
    #[serde(rename = "type")]
    kind: String,
}

impl TrackRef {
    fn song(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: "songs".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatePlaylistResponse {
    data: Vec<CreatedPlaylist>,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: String,
}

/// Apple Music 曲库客户端
pub struct AppleMusicClient {
    client: Client,
    config: AppleMusicClientConfig,
}

impl AppleMusicClient {
    pub fn new(config: AppleMusicClientConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl MusicCatalogPort for AppleMusicClient {
    fn service(&self) -> MusicService {
        MusicService::AppleMusic
    }

    async fn search_tracks(
        &self,
        access_token: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogError> {
        let url = format!(
            "{}/catalog/{}/search",
            self.config.base_url, self.config.storefront
        );

        let limit = limit.to_string();
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.developer_token)
            .header("Music-User-Token", access_token)
            .query(&[
                ("term", query),
                ("types", "songs"),
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
            .results
            .songs
            .map(|page| page.data)
            .unwrap_or_default()
            .into_iter()
            .map(|s| CatalogTrack {
                is_instrumental: infer_instrumental(&s.attributes.name),
                duration_secs: (s.attributes.duration_in_millis / 1000) as u32,
                artist: s.attributes.artist_name,
                album: s.attributes.album_name,
                external_id: s.id,
                title: s.attributes.name,
            })
            .collect();

        Ok(tracks)
    }

    async fn create_playlist(
        &self,
        access_token: &str,
        _external_user_id: &str,
        name: &str,
        description: Option<&str>,
        track_ids: &[String],
    ) -> Result<String, CatalogError> {
        let url = format!("{}/me/library/playlists", self.config.base_url);

        let request = CreatePlaylistRequest {
            attributes: PlaylistAttributes { name, description },
            relationships: PlaylistRelationships {
                tracks: TracksRelationship {
                    data: track_ids.iter().map(|id| TrackRef::song(id)).collect(),
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.developer_token)
            .header("Music-User-Token", access_token)
            .json(&request)
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

        let playlist_id = created
            .data
            .into_iter()
            .next()
            .map(|p| p.id)
            .ok_or_else(|| {
                CatalogError::InvalidResponse("empty playlist creation response".to_string())
            })?;

        tracing::info!(
            playlist_id = %playlist_id,
            track_count = track_ids.len(),
            "Apple Music playlist created"
        );

        Ok(playlist_id)
    }

    async fn replace_tracks(
        &self,
        access_token: &str,
        external_playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        let url = format!(
            "{}/me/library/playlists/{}/tracks",
            self.config.base_url, external_playlist_id
        );

        let request = TracksRelationship {
            data: track_ids.iter().map(|id| TrackRef::song(id)).collect(),
        };

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.config.developer_token)
            .header("Music-User-Token", access_token)
            .json(&request)
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
    fn test_search_response_parsing() {
        let json = r#"{
            "results": {
                "songs": {
                    "data": [{
                        "id": "am-1",
                        "attributes": {
                            "name": "Experience",
                            "artistName": "Ludovico Einaudi",
                            "albumName": "In a Time Lapse",
                            "durationInMillis": 315000
                        }
                    }]
                }
            }
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let songs = parsed.results.songs.unwrap();
        assert_eq!(songs.data[0].attributes.duration_in_millis, 315000);
    }

    #[test]
    fn test_empty_results_tolerated() {
        let json = r#"{"results": {}}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.results.songs.is_none());
    }

    #[test]
    fn test_track_ref_shape() {
        let track = TrackRef::song("am-1");
        let json = serde_json::to_string(&track).unwrap();
        assert!(json.contains(r#""type":"songs""#));
    }
}
