//! Generation Worker - Background Playlist Pipeline
//!
//! 从队列消费生成任务，串联分析 → 选曲 → 落库三个阶段。

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::commands::handlers::ensure_analysis;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    generate_cache_key, AnalysisProviderPort, AnalysisRecord, AnalysisRepositoryPort,
    BookRecord, BookRepositoryPort, CatalogCachePort, CatalogTrack, JobManagerPort, JobState,
    LibraryRepositoryPort, MusicCatalogPort, PlaylistRecord, PlaylistRepositoryPort,
    ServiceConnectionRecord, TrackRecord, UserRecord, UserRepositoryPort,
};
use crate::domain::analysis::{AnalysisId, BookAnalysis};
use crate::domain::playlist::{
    select_tracks, Playlist, SelectionConfig, Track, TrackCandidate,
};
use crate::domain::user::MusicService;
use crate::domain::{build_playlist_prompt, build_search_queries};
use crate::infrastructure::events::EventPublisher;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct GenerationWorkerConfig {
    /// 最大并发生成数
    pub max_concurrent: usize,
    /// 每个搜索词的曲库返回条数
    pub search_limit: usize,
}

impl Default for GenerationWorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            search_limit: 25,
        }
    }
}

/// Worker 依赖集合（spawn 时整体克隆）
#[derive(Clone)]
pub struct WorkerContext {
    pub job_manager: Arc<dyn JobManagerPort>,
    pub library_repo: Arc<dyn LibraryRepositoryPort>,
    pub book_repo: Arc<dyn BookRepositoryPort>,
    pub user_repo: Arc<dyn UserRepositoryPort>,
    pub analysis_repo: Arc<dyn AnalysisRepositoryPort>,
    pub playlist_repo: Arc<dyn PlaylistRepositoryPort>,
    pub provider: Arc<dyn AnalysisProviderPort>,
    pub catalogs: Arc<HashMap<MusicService, Arc<dyn MusicCatalogPort>>>,
    pub catalog_cache: Arc<dyn CatalogCachePort>,
    pub event_publisher: Arc<EventPublisher>,
}

/// 生成 Worker
///
/// 后台任务处理器，从队列消费任务并执行歌单生成流水线
pub struct GenerationWorker {
    config: GenerationWorkerConfig,
    queue_receiver: mpsc::Receiver<String>,
    ctx: WorkerContext,
}

impl GenerationWorker {
    pub fn new(
        config: GenerationWorkerConfig,
        queue_receiver: mpsc::Receiver<String>,
        ctx: WorkerContext,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            ctx,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "GenerationWorker started"
        );

        // 使用 semaphore 控制并发
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent));

        while let Some(job_id) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to acquire semaphore permit");
                    continue;
                }
            };

            let ctx = self.ctx.clone();
            let config = self.config.clone();

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到任务完成

                Self::process_job(&job_id, ctx, config).await;
            });
        }

        tracing::info!("GenerationWorker stopped");
    }

    /// 处理单个任务
    async fn process_job(job_id: &str, ctx: WorkerContext, config: GenerationWorkerConfig) {
        // 获取任务信息
        let job = match ctx.job_manager.get_job(job_id) {
            Some(job) => job,
            None => {
                tracing::warn!(job_id = %job_id, "Job not found, skipping");
                return;
            }
        };

        // Check 1: 任务是否已取消
        if ctx.job_manager.is_cancelled(job_id) {
            tracing::debug!(job_id = %job_id, "Job cancelled, skipping");
            return;
        }

        let user_id = job.user_id;
        let user_book_id = job.user_book_id;

        match Self::run_pipeline(job_id, &job.user_id, user_book_id, job.force_reanalyze, &ctx, &config)
            .await
        {
            Ok(playlist) => {
                let _ = ctx.job_manager.set_playlist(job_id, playlist.id);
                let _ = ctx.job_manager.set_state(job_id, JobState::Ready);
                ctx.event_publisher
                    .publish_job_state(&user_id, job_id, user_book_id, JobState::Ready);

                tracing::info!(
                    job_id = %job_id,
                    user_book_id = %user_book_id,
                    playlist_id = %playlist.id,
                    total_duration = playlist.total_duration,
                    "Generation job completed"
                );
            }
            Err(PipelineOutcome::Cancelled) => {
                tracing::debug!(job_id = %job_id, "Job cancelled mid-pipeline, result dropped");
            }
            Err(PipelineOutcome::Failed(e)) => {
                tracing::error!(job_id = %job_id, error = %e, "Generation job failed");
                let _ = ctx.job_manager.set_failed(job_id, e.to_string());
                ctx.event_publisher
                    .publish_job_failed(&user_id, job_id, user_book_id, &e.to_string());
                ctx.event_publisher
                    .publish_playlist_failed(&user_id, user_book_id, &e.to_string());
            }
        }
    }

    /// 分析 → 选曲 → 落库
    async fn run_pipeline(
        job_id: &str,
        user_id: &Uuid,
        user_book_id: Uuid,
        force_reanalyze: bool,
        ctx: &WorkerContext,
        config: &GenerationWorkerConfig,
    ) -> Result<PlaylistRecord, PipelineOutcome> {
        // 载入书架条目、书籍、用户
        let user_book = ctx
            .library_repo
            .find_by_id(user_book_id)
            .await
            .map_err(fail)?
            .ok_or_else(|| {
                PipelineOutcome::Failed(ApplicationError::not_found("UserBook", user_book_id))
            })?;
        let book = ctx
            .book_repo
            .find_by_id(user_book.book_id)
            .await
            .map_err(fail)?
            .ok_or_else(|| {
                PipelineOutcome::Failed(ApplicationError::not_found("Book", user_book.book_id))
            })?;
        let user = ctx
            .user_repo
            .find_by_id(user_book.user_id)
            .await
            .map_err(fail)?
            .ok_or_else(|| {
                PipelineOutcome::Failed(ApplicationError::not_found("User", user_book.user_id))
            })?;

        // 阶段一：分析
        let _ = ctx.job_manager.set_state(job_id, JobState::Analyzing);
        ctx.event_publisher
            .publish_job_state(user_id, job_id, user_book_id, JobState::Analyzing);

        let (analysis_record, newly_analyzed) = ensure_analysis(
            &ctx.analysis_repo,
            &ctx.provider,
            user_book_id,
            &book,
            None,
            force_reanalyze,
        )
        .await
        .map_err(|e| {
            ctx.event_publisher
                .publish_analysis_failed(user_id, user_book_id, &e.to_string());
            PipelineOutcome::Failed(e)
        })?;

        if newly_analyzed {
            ctx.event_publisher.publish_analysis_ready(
                user_id,
                user_book_id,
                analysis_record.id,
                analysis_record.confidence,
            );
        }

        // Check 2: 分析后再次检查取消
        if ctx.job_manager.is_cancelled(job_id) {
            return Err(PipelineOutcome::Cancelled);
        }

        // 阶段二：选曲
        let _ = ctx.job_manager.set_state(job_id, JobState::Synthesizing);
        ctx.event_publisher
            .publish_job_state(user_id, job_id, user_book_id, JobState::Synthesizing);

        let analysis = restore_analysis(&analysis_record);

        let (service, connection) = resolve_catalog(&user, ctx).await.map_err(fail)?;
        let catalog = ctx.catalogs.get(&service).ok_or_else(|| {
            PipelineOutcome::Failed(ApplicationError::internal(format!(
                "No catalog client for {}",
                service
            )))
        })?;

        let candidates = Self::collect_candidates(
            catalog,
            &connection,
            &analysis,
            service,
            ctx,
            config.search_limit,
        )
        .await;

        if candidates.is_empty() {
            return Err(PipelineOutcome::Failed(
                ApplicationError::ExternalServiceError(format!(
                    "Catalog search returned no candidates on {}",
                    service
                )),
            ));
        }

        let selection_config = SelectionConfig::new(user.preferences.playlist_length.target_secs())
            .with_instrumental_only(user.preferences.instrumental_only);
        let (required_secs, _) = selection_config.bounds();

        let selected =
            select_tracks(candidates.iter().map(|(c, _)| c.clone()).collect(), &selection_config)
                .ok_or_else(|| {
                    PipelineOutcome::Failed(ApplicationError::business_rule(format!(
                        "Not enough candidates to reach target duration (minimum {} secs)",
                        required_secs
                    )))
                })?;

        // Check 3: 网络往返后再次检查取消
        if ctx.job_manager.is_cancelled(job_id) {
            return Err(PipelineOutcome::Cancelled);
        }

        // 阶段三：落库
        let prompt = build_playlist_prompt(&analysis, &user.preferences);
        let name = playlist_name(&book, &analysis);
        let description = if analysis.vibe().is_empty() {
            None
        } else {
            Some(analysis.vibe().to_string())
        };

        let tracks: Vec<Track> = selected
            .iter()
            .map(|candidate| {
                let external_id = candidates
                    .iter()
                    .find(|(c, _)| c == candidate)
                    .map(|(_, id)| id.clone());
                candidate_to_track(candidate, service, external_id)
            })
            .collect();

        let playlist = Playlist::new(user_book_id, name, description, tracks, prompt)
            .map_err(|e| PipelineOutcome::Failed(ApplicationError::internal(e.to_string())))?;

        let is_first = ctx
            .playlist_repo
            .count_by_user_book(user_book_id)
            .await
            .map_err(fail)?
            == 0;

        let (playlist_record, track_records) = to_records(&playlist);
        ctx.playlist_repo
            .save(&playlist_record, &track_records)
            .await
            .map_err(fail)?;

        // 首个歌单自动激活
        if is_first {
            ctx.playlist_repo
                .activate(user_book_id, playlist_record.id)
                .await
                .map_err(fail)?;
        }

        ctx.event_publisher.publish_playlist_ready(
            user_id,
            user_book_id,
            playlist_record.id,
            &playlist_record.name,
            track_records.len(),
            playlist_record.total_duration,
        );

        Ok(playlist_record)
    }

    /// 按派生搜索词收集候选曲目（缓存优先）
    ///
    /// 单个搜索词失败只降级告警，不中断整个流水线
    async fn collect_candidates(
        catalog: &Arc<dyn MusicCatalogPort>,
        connection: &ServiceConnectionRecord,
        analysis: &BookAnalysis,
        service: MusicService,
        ctx: &WorkerContext,
        search_limit: usize,
    ) -> Vec<(TrackCandidate, String)> {
        let mood_tags: Vec<String> = analysis.mood().iter().map(|m| m.name.clone()).collect();
        let mut candidates = Vec::new();

        for query in build_search_queries(analysis) {
            let cache_key = generate_cache_key(service, &query);

            let results: Vec<CatalogTrack> = match ctx.catalog_cache.get(&cache_key).await {
                Ok(Some(cached)) => cached,
                _ => match catalog
                    .search_tracks(&connection.access_token, &query, search_limit)
                    .await
                {
                    Ok(results) => {
                        if let Err(e) = ctx.catalog_cache.put(&cache_key, &results).await {
                            tracing::warn!(error = %e, "Failed to cache search results");
                        }
                        results
                    }
                    Err(e) => {
                        tracing::warn!(
                            query = %query,
                            service = %service,
                            error = %e,
                            "Catalog search failed, skipping query"
                        );
                        continue;
                    }
                },
            };

            for result in results {
                let candidate = TrackCandidate {
                    title: result.title.clone(),
                    artist: result.artist.clone(),
                    album: result.album.clone(),
                    duration_secs: result.duration_secs,
                    is_instrumental: result.is_instrumental,
                    mood_tags: mood_tags.clone(),
                    rationale: Some(format!("Matched search \"{}\"", query)),
                };
                candidates.push((candidate, result.external_id));
            }
        }

        candidates
    }
}

/// 流水线中断原因
enum PipelineOutcome {
    Cancelled,
    Failed(ApplicationError),
}

fn fail(e: impl Into<ApplicationError>) -> PipelineOutcome {
    PipelineOutcome::Failed(e.into())
}

/// 选择候选来源曲库：默认服务优先，否则任一已连接服务
async fn resolve_catalog(
    user: &UserRecord,
    ctx: &WorkerContext,
) -> Result<(MusicService, ServiceConnectionRecord), ApplicationError> {
    let mut services = Vec::new();
    if let Some(preferred) = user.preferences.default_music_service {
        services.push(preferred);
    }
    for service in MusicService::all() {
        if !services.contains(&service) {
            services.push(service);
        }
    }

    for service in services {
        if let Some(connection) = ctx
            .user_repo
            .find_connection(user.id, service.as_str())
            .await?
        {
            let expired = connection
                .expires_at
                .map(|at| at <= chrono::Utc::now())
                .unwrap_or(false);
            if expired {
                tracing::warn!(
                    user_id = %user.id,
                    service = %service,
                    "Connection expired, trying next service"
                );
                continue;
            }
            return Ok((service, connection));
        }
    }

    Err(ApplicationError::business_rule(
        "No connected music service available for playlist generation",
    ))
}

/// 从持久化记录重建分析实体
fn restore_analysis(record: &AnalysisRecord) -> BookAnalysis {
    BookAnalysis::restore(
        AnalysisId::from_uuid(record.id),
        record.user_book_id,
        record.analyzed_at,
        record.mood.clone(),
        record.themes.clone(),
        record.setting.clone(),
        record.pace,
        record.intensity,
        record.time_of_day.clone(),
        record.vibe.clone(),
        record.music_description.clone(),
        record.analysis_source,
        record.confidence,
        record.model_used.clone(),
    )
}

/// 歌单命名：书名 + 主导情绪
fn playlist_name(book: &BookRecord, analysis: &BookAnalysis) -> String {
    match analysis.dominant_mood() {
        Some(mood) => format!("{} · {}", book.title, mood.name),
        None => format!("{} · reading mix", book.title),
    }
}

fn candidate_to_track(
    candidate: &TrackCandidate,
    service: MusicService,
    external_id: Option<String>,
) -> Track {
    let mut track = Track::new(
        candidate.title.clone(),
        candidate.artist.clone(),
        candidate.duration_secs,
    );
    track.album = candidate.album.clone();
    track.is_instrumental = candidate.is_instrumental;
    track.mood_tags = candidate.mood_tags.clone();
    track.ai_rationale = candidate.rationale.clone();
    if let Some(external_id) = external_id {
        track.set_external_id(service, external_id);
    }
    track
}

/// 聚合 → 持久化记录
fn to_records(playlist: &Playlist) -> (PlaylistRecord, Vec<TrackRecord>) {
    let playlist_id = *playlist.id().as_uuid();

    let track_records = playlist
        .tracks()
        .iter()
        .enumerate()
        .map(|(position, track)| TrackRecord {
            id: track.id,
            playlist_id,
            position: position as u32,
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            duration_secs: track.duration_secs,
            spotify_id: track.spotify_id.clone(),
            apple_music_id: track.apple_music_id.clone(),
            youtube_music_id: track.youtube_music_id.clone(),
            is_instrumental: track.is_instrumental,
            mood_tags: track.mood_tags.clone(),
            ai_rationale: track.ai_rationale.clone(),
        })
        .collect();

    let playlist_record = PlaylistRecord {
        id: playlist_id,
        user_book_id: *playlist.user_book_id(),
        name: playlist.name().to_string(),
        description: playlist.description().map(String::from),
        total_duration: playlist.total_duration(),
        generated_at: playlist.generated_at(),
        generation_prompt: playlist.generation_prompt().to_string(),
        spotify_playlist_id: None,
        apple_music_playlist_id: None,
        youtube_music_playlist_id: None,
        is_active: playlist.is_active(),
        created_at: playlist.created_at(),
        updated_at: playlist.updated_at(),
    };

    (playlist_record, track_records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{
        AnalysisSource, IntensityLevel, Mood, Pace, Setting, TimeOfDay,
    };
    use chrono::Utc;

    fn sample_record(user_book_id: Uuid) -> AnalysisRecord {
        AnalysisRecord {
            id: Uuid::new_v4(),
            user_book_id,
            analyzed_at: Utc::now(),
            mood: vec![
                Mood::new("tense", 0.9).unwrap(),
                Mood::new("hopeful", 0.3).unwrap(),
            ],
            themes: vec!["survival".to_string()],
            setting: Setting::default(),
            pace: Pace::Fast,
            intensity: IntensityLevel::Intense,
            time_of_day: vec![TimeOfDay::Night],
            vibe: "步步紧逼".to_string(),
            music_description: "driving percussion".to_string(),
            analysis_source: AnalysisSource::FullContent,
            confidence: 0.9,
            model_used: "claude-3-opus".to_string(),
        }
    }

    fn sample_book() -> BookRecord {
        let now = Utc::now();
        BookRecord {
            id: Uuid::new_v4(),
            title: "The Martian".to_string(),
            authors: vec!["Andy Weir".to_string()],
            description: None,
            cover_image_url: None,
            genres: vec!["Sci-Fi".to_string()],
            source: crate::domain::book::BookSource::Manual,
            external_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_restore_analysis_preserves_fields() {
        let record = sample_record(Uuid::new_v4());
        let analysis = restore_analysis(&record);

        assert_eq!(analysis.confidence(), 0.9);
        assert_eq!(analysis.dominant_mood().unwrap().name, "tense");
        assert_eq!(analysis.pace(), Pace::Fast);
    }

    #[test]
    fn test_playlist_name_uses_dominant_mood() {
        let record = sample_record(Uuid::new_v4());
        let analysis = restore_analysis(&record);
        assert_eq!(playlist_name(&sample_book(), &analysis), "The Martian · tense");
    }

    #[test]
    fn test_candidate_to_track_sets_service_id() {
        let candidate = TrackCandidate {
            title: "T".to_string(),
            artist: "A".to_string(),
            album: None,
            duration_secs: 200,
            is_instrumental: Some(true),
            mood_tags: vec!["tense".to_string()],
            rationale: Some("Matched search \"driving percussion\"".to_string()),
        };

        let track = candidate_to_track(&candidate, MusicService::Spotify, Some("sp-1".to_string()));
        assert_eq!(track.spotify_id, Some("sp-1".to_string()));
        assert!(track.apple_music_id.is_none());
        assert_eq!(track.mood_tags, vec!["tense".to_string()]);
    }

    #[test]
    fn test_to_records_positions_and_duration() {
        let user_book_id = Uuid::new_v4();
        let tracks = vec![Track::new("a", "x", 100), Track::new("b", "y", 150)];
        let playlist = Playlist::new(user_book_id, "Mix", None, tracks, "prompt").unwrap();

        let (record, track_records) = to_records(&playlist);
        assert_eq!(record.total_duration, 250);
        assert_eq!(track_records.len(), 2);
        assert_eq!(track_records[0].position, 0);
        assert_eq!(track_records[1].position, 1);
    }
}
