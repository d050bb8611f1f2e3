//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repositories、AnalysisProvider、MusicCatalog 等）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Analysis commands
    RequestAnalysis,
    // Export commands
    ExportPlaylist,
    // Library commands
    AddBookToLibrary,
    RemoveBookFromLibrary,
    UpdateReadingStatus,
    // Playlist commands
    ActivatePlaylist,
    DeletePlaylist,
    GeneratePlaylist,
    // User commands
    ConnectService,
    DisconnectService,
    RegisterUser,
    UpdatePreferences,
    // Handlers
    handlers::{
        ensure_analysis, ActivatePlaylistHandler, AddBookToLibraryHandler,
        AddBookToLibraryResponse, ConnectServiceHandler, DeletePlaylistHandler,
        DisconnectServiceHandler, ExportPlaylistHandler, ExportResult, ExportRetryConfig,
        GeneratePlaylistHandler, GeneratePlaylistResponse, RegisterUserHandler,
        RegisterUserResponse, RemoveBookFromLibraryHandler, RequestAnalysisHandler,
        UpdatePreferencesHandler, UpdateReadingStatusHandler, UpdateReadingStatusResponse,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Analysis provider
    AnalysisProviderPort,
    AnalysisProviderRequest,
    ProviderAnalysis,
    ProviderError,
    ProviderMood,
    // Catalog cache
    generate_cache_key,
    CacheError,
    CacheStats,
    CatalogCachePort,
    // Job manager
    GenerationJob,
    JobError,
    JobManagerPort,
    JobState,
    // Music catalog
    CatalogError,
    CatalogTrack,
    MusicCatalogPort,
    // Repositories
    AnalysisRecord,
    AnalysisRepositoryPort,
    BookRecord,
    BookRepositoryPort,
    LibraryRepositoryPort,
    PlaylistRecord,
    PlaylistRepositoryPort,
    RepositoryError,
    ServiceConnectionRecord,
    TrackRecord,
    UserBookRecord,
    UserRecord,
    UserRepositoryPort,
};

pub use queries::{
    // Job queries
    GetJobStatus,
    // Library queries
    GetAnalysis,
    GetLibrary,
    GetUserBook,
    // Playlist queries
    GetPlaylist,
    ListPlaylists,
    // User queries
    GetUser,
    // Handlers
    handlers::{
        GetAnalysisHandler, GetJobStatusHandler, GetLibraryHandler, GetPlaylistHandler,
        GetUserBookHandler, GetUserHandler, LibraryEntry, ListPlaylistsHandler, PlaylistDetails,
        UserBookDetails, UserDetails,
    },
};
