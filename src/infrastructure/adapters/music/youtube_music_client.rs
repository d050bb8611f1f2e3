//! YouTube Music Catalog Client
//!
//! 基于 YouTube Data API v3:
//! - GET    /search?type=video&videoCategoryId=10
//! - GET    /videos?part=contentDetails（补时长）
//! - POST   /playlists
//! - POST   /playlistItems / DELETE /playlistItems（整体替换）

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{error_from_reqwest, error_from_response, infer_instrumental};
use crate::application::ports::{CatalogError, CatalogTrack, MusicCatalogPort};
use crate::domain::user::MusicService;

/// YouTube Music 客户端配置
#[derive(Debug, Clone)]
pub struct YoutubeMusicClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for YoutubeMusicClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            timeout_secs: 30,
        }
    }
}

// ---- Search / Videos 响应 ----

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

// ---- Playlist 请求/响应 ----

#[derive(Debug, Serialize)]
struct CreatePlaylistRequest<'a> {
    snippet: PlaylistSnippet<'a>,
    status: PlaylistStatus,
}

#[derive(Debug, Serialize)]
struct PlaylistSnippet<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistStatus {
    privacy_status: &'static str,
}

#[derive(Debug, Deserialize)]
struct CreatePlaylistResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct InsertItemRequest {
    snippet: InsertItemSnippet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertItemSnippet {
    playlist_id: String,
    resource_id: ResourceId,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    kind: String,
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct ListItemsResponse {
    items: Vec<ListedItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedItem {
    id: String,
}

/// 解析 ISO8601 时长（如 PT3M25S）为秒
fn parse_iso8601_duration(s: &str) -> Option<u32> {
    let rest = s.strip_prefix("PT")?;
    let mut total: u32 = 0;
    let mut number = String::new();

    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            number.push(ch);
            continue;
        }
        let value: u32 = number.parse().ok()?;
        number.clear();
        match ch {
            'H' => total += value * 3600,
            'M' => total += value * 60,
            'S' => total += value,
            _ => return None,
        }
    }

    if !number.is_empty() {
        return None;
    }
    Some(total)
}

/// YouTube Music 曲库客户端
pub struct YoutubeMusicClient {
    client: Client,
    config: YoutubeMusicClientConfig,
}

impl YoutubeMusicClient {
    pub fn new(config: YoutubeMusicClientConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn with_default_config() -> Result<Self, CatalogError> {
        Self::new(YoutubeMusicClientConfig::default())
    }

    /// 查询视频时长（search 响应不含时长）
    async fn fetch_durations(
        &self,
        access_token: &str,
        video_ids: &[String],
    ) -> Result<Vec<(String, u32)>, CatalogError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/videos", self.config.base_url);
        let ids = video_ids.join(",");
        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("part", "contentDetails"), ("id", ids.as_str())])
            .send()
            .await
            .map_err(error_from_reqwest)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: VideosResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        Ok(body
            .items
            .into_iter()
            .filter_map(|v| {
                parse_iso8601_duration(&v.content_details.duration).map(|secs| (v.id, secs))
            })
            .collect())
    }

    /// 列出远端歌单的条目 ID（翻页）
    async fn list_item_ids(
        &self,
        access_token: &str,
        playlist_id: &str,
    ) -> Result<Vec<String>, CatalogError> {
        let url = format!("{}/playlistItems", self.config.base_url);
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(access_token)
                .query(&[
                    ("part", "id"),
                    ("playlistId", playlist_id),
                    ("maxResults", "50"),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await.map_err(error_from_reqwest)?;
            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }

            let body: ListItemsResponse = response
                .json()
                .await
                .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

            ids.extend(body.items.into_iter().map(|i| i.id));

            match body.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(ids)
    }

    async fn insert_item(
        &self,
        access_token: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(), CatalogError> {
        let url = format!("{}/playlistItems", self.config.base_url);
        let request = InsertItemRequest {
            snippet: InsertItemSnippet {
                playlist_id: playlist_id.to_string(),
                resource_id: ResourceId {
                    kind: "youtube#video".to_string(),
                    video_id: video_id.to_string(),
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .query(&[("part", "snippet")])
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

#[async_trait]
impl MusicCatalogPort for YoutubeMusicClient {
    fn service(&self) -> MusicService {
        MusicService::YoutubeMusic
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
                ("part", "snippet"),
                ("type", "video"),
                ("videoCategoryId", "10"), // Music
                ("maxResults", limit.as_str()),
                ("q", query),
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

        let video_ids: Vec<String> = body.items.iter().map(|i| i.id.video_id.clone()).collect();
        let durations = self.fetch_durations(access_token, &video_ids).await?;

        let tracks = body
            .items
            .into_iter()
            .filter_map(|item| {
                let duration_secs = durations
                    .iter()
                    .find(|(id, _)| *id == item.id.video_id)
                    .map(|(_, secs)| *secs)?;
                Some(CatalogTrack {
                    is_instrumental: infer_instrumental(&item.snippet.title),
                    duration_secs,
                    artist: item.snippet.channel_title,
                    album: None,
                    external_id: item.id.video_id,
                    title: item.snippet.title,
                })
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
        let url = format!("{}/playlists", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .query(&[("part", "snippet,status")])
            .json(&CreatePlaylistRequest {
                snippet: PlaylistSnippet {
                    title: name,
                    description,
                },
                status: PlaylistStatus {
                    privacy_status: "private",
                },
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

        for video_id in track_ids {
            self.insert_item(access_token, &created.id, video_id).await?;
        }

        tracing::info!(
            playlist_id = %created.id,
            track_count = track_ids.len(),
            "YouTube playlist created"
        );

        Ok(created.id)
    }

    async fn replace_tracks(
        &self,
        access_token: &str,
        external_playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        // YouTube 无整体替换接口：先清空再逐条插入
        let existing = self
            .list_item_ids(access_token, external_playlist_id)
            .await?;

        let delete_url = format!("{}/playlistItems", self.config.base_url);
        for item_id in existing {
            let response = self
                .client
                .delete(&delete_url)
                .bearer_auth(access_token)
                .query(&[("id", item_id.as_str())])
                .send()
                .await
                .map_err(error_from_reqwest)?;

            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }
        }

        for video_id in track_ids {
            self.insert_item(access_token, external_playlist_id, video_id)
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso8601_duration() {
        assert_eq!(parse_iso8601_duration("PT3M25S"), Some(205));
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_iso8601_duration("PT45S"), Some(45));
        assert_eq!(parse_iso8601_duration("PT2H"), Some(7200));
    }

    #[test]
    fn test_parse_iso8601_duration_invalid() {
        assert_eq!(parse_iso8601_duration("3M25S"), None);
        assert_eq!(parse_iso8601_duration("PT3X"), None);
        assert_eq!(parse_iso8601_duration("PT25"), None);
    }

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{
            "items": [{
                "id": {"videoId": "v1"},
                "snippet": {"title": "Nuvole Bianche", "channelTitle": "Einaudi"}
            }]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.items[0].id.video_id, "v1");
    }
}
