//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::commands::handlers::{
    ActivatePlaylistHandler, AddBookToLibraryHandler, ConnectServiceHandler,
    DeletePlaylistHandler, DisconnectServiceHandler, ExportPlaylistHandler, ExportRetryConfig,
    GeneratePlaylistHandler, RegisterUserHandler, RemoveBookFromLibraryHandler,
    RequestAnalysisHandler, UpdatePreferencesHandler, UpdateReadingStatusHandler,
};
use crate::application::ports::{
    AnalysisProviderPort, AnalysisRepositoryPort, BookRepositoryPort, CatalogCachePort,
    JobManagerPort, LibraryRepositoryPort, MusicCatalogPort, PlaylistRepositoryPort,
    UserRepositoryPort,
};
use crate::application::queries::handlers::{
    GetAnalysisHandler, GetJobStatusHandler, GetLibraryHandler, GetPlaylistHandler,
    GetUserBookHandler, GetUserHandler, ListPlaylistsHandler,
};
use crate::domain::user::MusicService;
use crate::infrastructure::events::EventPublisher;

/// 应用状态
///
/// JobManager 为内存实现，仓储为 SQLite 实现
pub struct AppState {
    // ========== Ports ==========
    pub user_repo: Arc<dyn UserRepositoryPort>,
    pub book_repo: Arc<dyn BookRepositoryPort>,
    pub library_repo: Arc<dyn LibraryRepositoryPort>,
    pub analysis_repo: Arc<dyn AnalysisRepositoryPort>,
    pub playlist_repo: Arc<dyn PlaylistRepositoryPort>,
    pub job_manager: Arc<dyn JobManagerPort>,
    pub provider: Arc<dyn AnalysisProviderPort>,
    pub catalogs: Arc<HashMap<MusicService, Arc<dyn MusicCatalogPort>>>,
    pub catalog_cache: Arc<dyn CatalogCachePort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub register_user_handler: RegisterUserHandler,
    pub update_preferences_handler: UpdatePreferencesHandler,
    pub connect_service_handler: ConnectServiceHandler,
    pub disconnect_service_handler: DisconnectServiceHandler,
    pub add_book_handler: AddBookToLibraryHandler,
    pub update_status_handler: UpdateReadingStatusHandler,
    pub remove_book_handler: RemoveBookFromLibraryHandler,
    pub request_analysis_handler: RequestAnalysisHandler,
    pub generate_playlist_handler: GeneratePlaylistHandler,
    pub activate_playlist_handler: ActivatePlaylistHandler,
    pub delete_playlist_handler: DeletePlaylistHandler,
    pub export_playlist_handler: ExportPlaylistHandler,

    // ========== Query Handlers ==========
    pub get_user_handler: GetUserHandler,
    pub get_library_handler: GetLibraryHandler,
    pub get_user_book_handler: GetUserBookHandler,
    pub get_analysis_handler: GetAnalysisHandler,
    pub list_playlists_handler: ListPlaylistsHandler,
    pub get_playlist_handler: GetPlaylistHandler,
    pub get_job_status_handler: GetJobStatusHandler,
}

impl AppState {
    /// 创建应用状态
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: Arc<dyn UserRepositoryPort>,
        book_repo: Arc<dyn BookRepositoryPort>,
        library_repo: Arc<dyn LibraryRepositoryPort>,
        analysis_repo: Arc<dyn AnalysisRepositoryPort>,
        playlist_repo: Arc<dyn PlaylistRepositoryPort>,
        job_manager: Arc<dyn JobManagerPort>,
        provider: Arc<dyn AnalysisProviderPort>,
        catalogs: Arc<HashMap<MusicService, Arc<dyn MusicCatalogPort>>>,
        catalog_cache: Arc<dyn CatalogCachePort>,
        event_publisher: Arc<EventPublisher>,
        export_retry: ExportRetryConfig,
    ) -> Self {
        Self {
            // Command handlers
            register_user_handler: RegisterUserHandler::new(user_repo.clone()),
            update_preferences_handler: UpdatePreferencesHandler::new(user_repo.clone()),
            connect_service_handler: ConnectServiceHandler::new(user_repo.clone()),
            disconnect_service_handler: DisconnectServiceHandler::new(user_repo.clone()),
            add_book_handler: AddBookToLibraryHandler::new(
                user_repo.clone(),
                book_repo.clone(),
                library_repo.clone(),
            ),
            update_status_handler: UpdateReadingStatusHandler::new(
                user_repo.clone(),
                library_repo.clone(),
                job_manager.clone(),
            ),
            remove_book_handler: RemoveBookFromLibraryHandler::new(
                library_repo.clone(),
                job_manager.clone(),
            ),
            request_analysis_handler: RequestAnalysisHandler::new(
                library_repo.clone(),
                book_repo.clone(),
                analysis_repo.clone(),
                provider.clone(),
                event_publisher.clone(),
            ),
            generate_playlist_handler: GeneratePlaylistHandler::new(
                library_repo.clone(),
                job_manager.clone(),
            ),
            activate_playlist_handler: ActivatePlaylistHandler::new(playlist_repo.clone()),
            delete_playlist_handler: DeletePlaylistHandler::new(playlist_repo.clone()),
            export_playlist_handler: ExportPlaylistHandler::new(
                playlist_repo.clone(),
                library_repo.clone(),
                user_repo.clone(),
                catalogs.as_ref().clone(),
                catalog_cache.clone(),
                event_publisher.clone(),
                export_retry,
            ),

            // Query handlers
            get_user_handler: GetUserHandler::new(user_repo.clone()),
            get_library_handler: GetLibraryHandler::new(library_repo.clone(), book_repo.clone()),
            get_user_book_handler: GetUserBookHandler::new(
                library_repo.clone(),
                book_repo.clone(),
                analysis_repo.clone(),
                playlist_repo.clone(),
            ),
            get_analysis_handler: GetAnalysisHandler::new(analysis_repo.clone()),
            list_playlists_handler: ListPlaylistsHandler::new(playlist_repo.clone()),
            get_playlist_handler: GetPlaylistHandler::new(playlist_repo.clone()),
            get_job_status_handler: GetJobStatusHandler::new(job_manager.clone()),

            // Ports
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
        }
    }
}
