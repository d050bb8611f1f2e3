//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod analysis_provider;
mod catalog_cache;
mod job_manager;
mod music_catalog;
mod repositories;

pub use analysis_provider::{
    AnalysisProviderPort, AnalysisProviderRequest, ProviderAnalysis, ProviderError, ProviderMood,
};
pub use catalog_cache::{generate_cache_key, CacheError, CacheStats, CatalogCachePort};
pub use job_manager::{GenerationJob, JobError, JobManagerPort, JobState};
pub use music_catalog::{CatalogError, CatalogTrack, MusicCatalogPort};
pub use repositories::{
    AnalysisRecord, AnalysisRepositoryPort, BookRecord, BookRepositoryPort, LibraryRepositoryPort,
    PlaylistRecord, PlaylistRepositoryPort, RepositoryError, ServiceConnectionRecord, TrackRecord,
    UserBookRecord, UserRecord, UserRepositoryPort,
};
