//! Export Command Handlers - 导出对账
//!
//! 把歌单映射到外部音乐服务：逐曲目对齐曲库 ID（带缓存），
//! 幂等创建/替换远端歌单，限流时指数退避重试。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::application::commands::ExportPlaylist;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    generate_cache_key, CatalogCachePort, CatalogError, CatalogTrack, LibraryRepositoryPort,
    MusicCatalogPort, PlaylistRepositoryPort, TrackRecord, UserRepositoryPort,
};
use crate::domain::user::MusicService;
use crate::infrastructure::events::EventPublisher;

/// 导出重试配置
#[derive(Debug, Clone)]
pub struct ExportRetryConfig {
    /// 限流时最大重试次数
    pub max_retries: u32,
    /// 退避基础延迟（毫秒）
    pub base_delay_ms: u64,
    /// 每条曲目的搜索条数
    pub search_limit: usize,
}

impl Default for ExportRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            search_limit: 5,
        }
    }
}

/// 指数退避延迟
///
/// 服务给出 Retry-After 时优先使用，否则 base * 2^attempt。
pub(crate) fn backoff_delay(
    attempt: u32,
    retry_after_secs: Option<u64>,
    base_delay_ms: u64,
) -> Duration {
    match retry_after_secs {
        Some(secs) => Duration::from_secs(secs),
        None => Duration::from_millis(base_delay_ms.saturating_mul(1u64 << attempt.min(10))),
    }
}

/// 导出结果
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub playlist_id: Uuid,
    pub service: MusicService,
    pub external_playlist_id: String,
    /// 对齐成功的曲目数
    pub matched: usize,
    /// 曲库未命中被跳过的曲目数
    pub unmatched: usize,
    /// 本次是否新建远端歌单（false 表示幂等替换）
    pub created: bool,
}

/// ExportPlaylist Handler - 导出对账器
pub struct ExportPlaylistHandler {
    playlist_repo: Arc<dyn PlaylistRepositoryPort>,
    library_repo: Arc<dyn LibraryRepositoryPort>,
    user_repo: Arc<dyn UserRepositoryPort>,
    catalogs: HashMap<MusicService, Arc<dyn MusicCatalogPort>>,
    catalog_cache: Arc<dyn CatalogCachePort>,
    event_publisher: Arc<EventPublisher>,
    retry: ExportRetryConfig,
}

impl ExportPlaylistHandler {
    pub fn new(
        playlist_repo: Arc<dyn PlaylistRepositoryPort>,
        library_repo: Arc<dyn LibraryRepositoryPort>,
        user_repo: Arc<dyn UserRepositoryPort>,
        catalogs: HashMap<MusicService, Arc<dyn MusicCatalogPort>>,
        catalog_cache: Arc<dyn CatalogCachePort>,
        event_publisher: Arc<EventPublisher>,
        retry: ExportRetryConfig,
    ) -> Self {
        Self {
            playlist_repo,
            library_repo,
            user_repo,
            catalogs,
            catalog_cache,
            event_publisher,
            retry,
        }
    }

    pub async fn handle(&self, command: ExportPlaylist) -> Result<ExportResult, ApplicationError> {
        let playlist = self
            .playlist_repo
            .find_by_id(command.playlist_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Playlist", command.playlist_id))?;

        let user_book = self
            .library_repo
            .find_by_id(playlist.user_book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("UserBook", playlist.user_book_id))?;

        let user = self
            .user_repo
            .find_by_id(user_book.user_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("User", user_book.user_id))?;

        // 目标服务：显式指定 > 用户默认
        let service = match command.service.or(user.preferences.default_music_service) {
            Some(service) => service,
            None => {
                return Err(ApplicationError::business_rule(
                    "No target service: none specified and no default music service set",
                ))
            }
        };

        let result = self.export(&playlist.id, user.id, service).await;

        match result {
            Ok(result) => {
                self.event_publisher.publish_export_completed(
                    &user.id,
                    result.playlist_id,
                    service,
                    &result.external_playlist_id,
                    result.matched,
                    result.unmatched,
                );
                Ok(result)
            }
            Err(e) => {
                self.event_publisher.publish_export_failed(
                    &user.id,
                    playlist.id,
                    service,
                    &e.to_string(),
                );
                Err(e)
            }
        }
    }

    async fn export(
        &self,
        playlist_id: &Uuid,
        user_id: Uuid,
        service: MusicService,
    ) -> Result<ExportResult, ApplicationError> {
        let catalog = self.catalogs.get(&service).ok_or_else(|| {
            ApplicationError::internal(format!("No catalog client for {}", service))
        })?;

        let connection = self
            .user_repo
            .find_connection(user_id, service.as_str())
            .await?
            .ok_or_else(|| {
                ApplicationError::business_rule(format!("Service not connected: {}", service))
            })?;

        if let Some(expires_at) = connection.expires_at {
            if expires_at <= chrono::Utc::now() {
                return Err(ApplicationError::business_rule(format!(
                    "Service credentials expired: {}",
                    service
                )));
            }
        }

        // 重新读歌单（含曲目）
        let playlist = self
            .playlist_repo
            .find_by_id(*playlist_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Playlist", *playlist_id))?;
        let tracks = self.playlist_repo.find_tracks(playlist.id).await?;

        // 逐曲目对齐曲库 ID
        let mut export_ids = Vec::with_capacity(tracks.len());
        let mut track_external_ids = Vec::new();
        let mut unmatched = 0usize;

        for track in &tracks {
            let existing = external_track_id(track, service);
            if let Some(id) = existing {
                export_ids.push(id.to_string());
                continue;
            }

            match self
                .resolve_track(catalog, &connection.access_token, track, service)
                .await?
            {
                Some(external_id) => {
                    export_ids.push(external_id.clone());
                    track_external_ids.push((track.id, external_id));
                }
                None => {
                    tracing::warn!(
                        playlist_id = %playlist.id,
                        track = %format!("{} - {}", track.artist, track.title),
                        service = %service,
                        "Track not found in catalog, skipping"
                    );
                    unmatched += 1;
                }
            }
        }

        if export_ids.is_empty() {
            return Err(ApplicationError::business_rule(format!(
                "No tracks could be matched in {} catalog",
                service
            )));
        }

        // 幂等：已有外部歌单则整体替换，否则新建
        let existing_external = external_playlist_id(&playlist, service).map(str::to_string);
        let (external_playlist_id, created) = match existing_external {
            Some(external_id) => {
                self.replace_with_retry(catalog, &connection.access_token, &external_id, &export_ids)
                    .await?;
                (external_id, false)
            }
            None => {
                let external_id = self
                    .create_with_retry(
                        catalog,
                        &connection.access_token,
                        &connection.external_user_id,
                        &playlist.name,
                        playlist.description.as_deref(),
                        &export_ids,
                    )
                    .await?;
                (external_id, true)
            }
        };

        // 单事务落库：歌单外部 ID + 曲目外部 ID
        self.playlist_repo
            .set_external_ids(
                playlist.id,
                service.as_str(),
                &external_playlist_id,
                &track_external_ids,
            )
            .await?;

        tracing::info!(
            playlist_id = %playlist.id,
            service = %service,
            external_playlist_id = %external_playlist_id,
            matched = export_ids.len(),
            unmatched = unmatched,
            created = created,
            "Playlist exported"
        );

        Ok(ExportResult {
            playlist_id: playlist.id,
            service,
            external_playlist_id,
            matched: export_ids.len(),
            unmatched,
            created,
        })
    }

    /// 在曲库中解析一条曲目（缓存优先）
    async fn resolve_track(
        &self,
        catalog: &Arc<dyn MusicCatalogPort>,
        access_token: &str,
        track: &TrackRecord,
        service: MusicService,
    ) -> Result<Option<String>, ApplicationError> {
        let query = format!("{} {}", track.title, track.artist);
        let cache_key = generate_cache_key(service, &query);

        let results = match self.catalog_cache.get(&cache_key).await {
            Ok(Some(cached)) => cached,
            Ok(None) => {
                let results = self
                    .search_with_retry(catalog, access_token, &query)
                    .await?;
                if let Err(e) = self.catalog_cache.put(&cache_key, &results).await {
                    tracing::warn!(error = %e, "Failed to cache search results");
                }
                results
            }
            Err(e) => {
                // 缓存故障退化为直查
                tracing::warn!(error = %e, "Catalog cache read failed, querying directly");
                self.search_with_retry(catalog, access_token, &query)
                    .await?
            }
        };

        Ok(pick_match(&results, &track.title, &track.artist))
    }

    async fn search_with_retry(
        &self,
        catalog: &Arc<dyn MusicCatalogPort>,
        access_token: &str,
        query: &str,
    ) -> Result<Vec<CatalogTrack>, ApplicationError> {
        let mut attempt = 0u32;
        loop {
            match catalog
                .search_tracks(access_token, query, self.retry.search_limit)
                .await
            {
                Err(CatalogError::RateLimited { retry_after_secs })
                    if attempt < self.retry.max_retries =>
                {
                    let delay =
                        backoff_delay(attempt, retry_after_secs, self.retry.base_delay_ms);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Catalog search rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other.map_err(Into::into),
            }
        }
    }

    async fn create_with_retry(
        &self,
        catalog: &Arc<dyn MusicCatalogPort>,
        access_token: &str,
        external_user_id: &str,
        name: &str,
        description: Option<&str>,
        track_ids: &[String],
    ) -> Result<String, ApplicationError> {
        let mut attempt = 0u32;
        loop {
            match catalog
                .create_playlist(access_token, external_user_id, name, description, track_ids)
                .await
            {
                Err(CatalogError::RateLimited { retry_after_secs })
                    if attempt < self.retry.max_retries =>
                {
                    let delay =
                        backoff_delay(attempt, retry_after_secs, self.retry.base_delay_ms);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Playlist creation rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other.map_err(Into::into),
            }
        }
    }

    async fn replace_with_retry(
        &self,
        catalog: &Arc<dyn MusicCatalogPort>,
        access_token: &str,
        external_playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ApplicationError> {
        let mut attempt = 0u32;
        loop {
            match catalog
                .replace_tracks(access_token, external_playlist_id, track_ids)
                .await
            {
                Err(CatalogError::RateLimited { retry_after_secs })
                    if attempt < self.retry.max_retries =>
                {
                    let delay =
                        backoff_delay(attempt, retry_after_secs, self.retry.base_delay_ms);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Track replacement rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other.map_err(Into::into),
            }
        }
    }
}

/// 曲目在某服务上的外部 ID
fn external_track_id(track: &TrackRecord, service: MusicService) -> Option<&str> {
    match service {
        MusicService::Spotify => track.spotify_id.as_deref(),
        MusicService::AppleMusic => track.apple_music_id.as_deref(),
        MusicService::YoutubeMusic => track.youtube_music_id.as_deref(),
    }
}

/// 歌单在某服务上的外部 ID
fn external_playlist_id(
    playlist: &crate::application::ports::PlaylistRecord,
    service: MusicService,
) -> Option<&str> {
    match service {
        MusicService::Spotify => playlist.spotify_playlist_id.as_deref(),
        MusicService::AppleMusic => playlist.apple_music_playlist_id.as_deref(),
        MusicService::YoutubeMusic => playlist.youtube_music_playlist_id.as_deref(),
    }
}

/// 从搜索结果中挑选匹配曲目
///
/// 优先 title+artist 精确匹配（忽略大小写），否则取相关度最高者。
fn pick_match(results: &[CatalogTrack], title: &str, artist: &str) -> Option<String> {
    let exact = results.iter().find(|r| {
        r.title.eq_ignore_ascii_case(title) && r.artist.eq_ignore_ascii_case(artist)
    });
    exact
        .or_else(|| results.first())
        .map(|r| r.external_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_track(title: &str, artist: &str, external_id: &str) -> CatalogTrack {
        CatalogTrack {
            title: title.to_string(),
            artist: artist.to_string(),
            album: None,
            duration_secs: 200,
            external_id: external_id.to_string(),
            is_instrumental: None,
        }
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(0, None, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_delay(1, None, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_delay(2, None, 1000), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_honors_retry_after() {
        assert_eq!(backoff_delay(0, Some(7), 1000), Duration::from_secs(7));
        assert_eq!(backoff_delay(5, Some(1), 1000), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_exponent_capped() {
        // 超大 attempt 不应溢出
        let delay = backoff_delay(64, None, 1000);
        assert_eq!(delay, Duration::from_millis(1000 * 1024));
    }

    #[test]
    fn test_pick_match_prefers_exact() {
        let results = vec![
            catalog_track("Nuvole Bianche (Live)", "Ludovico Einaudi", "live-1"),
            catalog_track("nuvole bianche", "ludovico einaudi", "studio-1"),
        ];
        assert_eq!(
            pick_match(&results, "Nuvole Bianche", "Ludovico Einaudi"),
            Some("studio-1".to_string())
        );
    }

    #[test]
    fn test_pick_match_falls_back_to_first() {
        let results = vec![
            catalog_track("Nuvole Bianche (Live)", "Ludovico Einaudi", "live-1"),
            catalog_track("Other", "Someone", "other-1"),
        ];
        assert_eq!(
            pick_match(&results, "Nuvole Bianche", "Ludovico Einaudi"),
            Some("live-1".to_string())
        );
    }

    #[test]
    fn test_pick_match_empty_results() {
        assert_eq!(pick_match(&[], "Title", "Artist"), None);
    }
}
