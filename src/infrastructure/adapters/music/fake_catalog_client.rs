//! Fake Catalog Client - 用于测试的曲库客户端
//!
//! 返回确定性的搜索结果，远端歌单写入记录在内存中

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::application::ports::{CatalogError, CatalogTrack, MusicCatalogPort};
use crate::domain::user::MusicService;

/// Fake Catalog Client
///
/// 用于测试与本地开发：
/// - 搜索结果由 query 确定性派生
/// - create/replace 写入内存，可在测试中断言
pub struct FakeCatalogClient {
    service: MusicService,
    /// external_playlist_id -> track_ids
    playlists: DashMap<String, Vec<String>>,
    /// 每条搜索返回的曲目数
    results_per_query: usize,
    /// 曲目时长（秒）
    track_duration_secs: u32,
}

impl FakeCatalogClient {
    pub fn new(service: MusicService) -> Self {
        Self {
            service,
            playlists: DashMap::new(),
            results_per_query: 10,
            track_duration_secs: 240,
        }
    }

    pub fn with_track_duration(mut self, secs: u32) -> Self {
        self.track_duration_secs = secs;
        self
    }

    /// 远端歌单的当前曲目（测试断言用）
    pub fn playlist_tracks(&self, external_playlist_id: &str) -> Option<Vec<String>> {
        self.playlists
            .get(external_playlist_id)
            .map(|t| t.clone())
    }

    /// 远端歌单数量（测试断言用）
    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }
}

#[async_trait]
impl MusicCatalogPort for FakeCatalogClient {
    fn service(&self) -> MusicService {
        self.service
    }

    async fn search_tracks(
        &self,
        _access_token: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogError> {
        // 由 query 确定性派生结果
        let digest = format!("{:x}", md5::compute(query.as_bytes()));
        let count = limit.min(self.results_per_query);

        let tracks = (0..count)
            .map(|i| CatalogTrack {
                title: format!("{} #{}", query, i),
                artist: format!("Artist {}", &digest[..6]),
                album: None,
                duration_secs: self.track_duration_secs,
                external_id: format!("{}-{}-{}", self.service.as_str(), &digest[..8], i),
                is_instrumental: Some(true),
            })
            .collect();

        Ok(tracks)
    }

    async fn create_playlist(
        &self,
        _access_token: &str,
        _external_user_id: &str,
        name: &str,
        _description: Option<&str>,
        track_ids: &[String],
    ) -> Result<String, CatalogError> {
        let playlist_id = format!("fake-{}-{}", self.service.as_str(), Uuid::new_v4());
        self.playlists
            .insert(playlist_id.clone(), track_ids.to_vec());

        tracing::debug!(
            playlist_id = %playlist_id,
            name = %name,
            track_count = track_ids.len(),
            "FakeCatalogClient: playlist created"
        );

        Ok(playlist_id)
    }

    async fn replace_tracks(
        &self,
        _access_token: &str,
        external_playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        match self.playlists.get_mut(external_playlist_id) {
            Some(mut tracks) => {
                *tracks = track_ids.to_vec();
                Ok(())
            }
            None => Err(CatalogError::NotFound(format!(
                "playlist {}",
                external_playlist_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_is_deterministic() {
        let client = FakeCatalogClient::new(MusicService::Spotify);

        let first = client.search_tracks("token", "ambient piano", 5).await.unwrap();
        let second = client.search_tracks("token", "ambient piano", 5).await.unwrap();

        assert_eq!(first.len(), 5);
        assert_eq!(first[0].external_id, second[0].external_id);
    }

    #[tokio::test]
    async fn test_create_then_replace() {
        let client = FakeCatalogClient::new(MusicService::Spotify);

        let playlist_id = client
            .create_playlist("token", "user", "Test", None, &["a".to_string()])
            .await
            .unwrap();
        assert_eq!(client.playlist_tracks(&playlist_id).unwrap(), vec!["a"]);

        client
            .replace_tracks("token", &playlist_id, &["b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(
            client.playlist_tracks(&playlist_id).unwrap(),
            vec!["b", "c"]
        );
        assert_eq!(client.playlist_count(), 1);
    }

    #[tokio::test]
    async fn test_replace_unknown_playlist_fails() {
        let client = FakeCatalogClient::new(MusicService::Spotify);
        let result = client.replace_tracks("token", "missing", &[]).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }
}
