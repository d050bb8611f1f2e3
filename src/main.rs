//! Underscore - 书籍氛围歌单生成系统
//!
//! 架构基于 DDD + CQRS + Hexagonal:
//! - Domain: book/, library/, analysis/, playlist/, user/ (Bounded Contexts)
//! - Application: commands, queries, ports
//! - Infrastructure: http, memory, worker, persistence, adapters, events

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use underscore::application::commands::handlers::ExportRetryConfig;
use underscore::application::ports::MusicCatalogPort;
use underscore::config::{load_config, print_config};
use underscore::domain::user::MusicService;
use underscore::infrastructure::adapters::{
    AppleMusicClient, AppleMusicClientConfig, HttpAnalysisClient, HttpAnalysisClientConfig,
    SpotifyClient, SpotifyClientConfig, YoutubeMusicClient, YoutubeMusicClientConfig,
};
// use underscore::infrastructure::adapters::{FakeAnalysisClient, FakeCatalogClient};
use underscore::infrastructure::events::EventPublisher;
use underscore::infrastructure::http::{AppState, HttpServer, ServerConfig};
use underscore::infrastructure::memory::InMemoryJobManager;
use underscore::infrastructure::persistence::sled::{SledCacheConfig, SledCatalogCache};
use underscore::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteAnalysisRepository, SqliteBookRepository,
    SqliteLibraryRepository, SqlitePlaylistRepository, SqliteUserRepository,
};
use underscore::infrastructure::worker::{
    GenerationWorker, GenerationWorkerConfig, WorkerContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},underscore={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Underscore - 书籍氛围歌单生成系统");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if let Some(parent) = std::path::Path::new(&config.catalog.cache_path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 创建 Repository 适配器
    let user_repo = Arc::new(SqliteUserRepository::new(pool.clone()));
    let book_repo = Arc::new(SqliteBookRepository::new(pool.clone()));
    let library_repo = Arc::new(SqliteLibraryRepository::new(pool.clone()));
    let analysis_repo = Arc::new(SqliteAnalysisRepository::new(pool.clone()));
    let playlist_repo = Arc::new(SqlitePlaylistRepository::new(pool.clone()));

    // 创建 AI 分析客户端
    let analysis_config = HttpAnalysisClientConfig {
        base_url: config.analysis.url.clone(),
        timeout_secs: config.analysis.timeout_secs,
        model: config.analysis.model.clone(),
    };
    let provider = Arc::new(HttpAnalysisClient::new(analysis_config)?);

    // // 创建 Fake 分析客户端（本地开发用，返回固定分析）
    // let provider = Arc::new(FakeAnalysisClient::with_defaults());

    // 创建音乐曲库客户端
    let spotify = Arc::new(SpotifyClient::new(SpotifyClientConfig {
        base_url: config.catalog.spotify_url.clone(),
        timeout_secs: 30,
    })?);
    let apple_music = Arc::new(AppleMusicClient::new(AppleMusicClientConfig {
        base_url: config.catalog.apple_music_url.clone(),
        developer_token: config.catalog.apple_music_developer_token.clone(),
        storefront: config.catalog.apple_music_storefront.clone(),
        timeout_secs: 30,
    })?);
    let youtube = Arc::new(YoutubeMusicClient::new(YoutubeMusicClientConfig {
        base_url: config.catalog.youtube_url.clone(),
        timeout_secs: 30,
    })?);

    let mut catalogs: HashMap<MusicService, Arc<dyn MusicCatalogPort>> = HashMap::new();
    catalogs.insert(MusicService::Spotify, spotify);
    catalogs.insert(MusicService::AppleMusic, apple_music);
    catalogs.insert(MusicService::YoutubeMusic, youtube);
    let catalogs = Arc::new(catalogs);

    // 创建 Sled 曲库搜索缓存
    let cache_config = SledCacheConfig {
        db_path: config.catalog.cache_path.clone(),
        max_size_bytes: config.catalog.cache_max_size_bytes,
    };
    let catalog_cache = Arc::new(SledCatalogCache::new(&cache_config)?);

    // 创建事件发布器
    let event_publisher = Arc::new(EventPublisher::new());

    // 创建任务队列与内存 Job 管理器
    let (job_tx, job_rx) = mpsc::channel(config.worker.queue_capacity);
    let job_manager = Arc::new(InMemoryJobManager::new(job_tx));

    // 创建 GenerationWorker
    let worker_config = GenerationWorkerConfig {
        max_concurrent: config.worker.max_concurrent,
        search_limit: config.catalog.search_limit,
    };
    let worker_ctx = WorkerContext {
        job_manager: job_manager.clone(),
        library_repo: library_repo.clone(),
        book_repo: book_repo.clone(),
        user_repo: user_repo.clone(),
        analysis_repo: analysis_repo.clone(),
        playlist_repo: playlist_repo.clone(),
        provider: provider.clone(),
        catalogs: catalogs.clone(),
        catalog_cache: catalog_cache.clone(),
        event_publisher: event_publisher.clone(),
    };
    let worker = GenerationWorker::new(worker_config, job_rx, worker_ctx);

    // 启动 Worker
    tokio::spawn(worker.run());

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let export_retry = ExportRetryConfig {
        max_retries: config.catalog.max_retries,
        base_delay_ms: config.catalog.base_delay_ms,
        search_limit: config.catalog.search_limit,
    };
    let state = AppState::new(
        user_repo,
        book_repo,
        library_repo,
        analysis_repo,
        playlist_repo,
        job_manager,
        provider,
        catalogs,
        catalog_cache,
        event_publisher,
        export_retry,
    );

    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
