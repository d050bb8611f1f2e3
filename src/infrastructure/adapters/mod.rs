//! Adapters - 外部服务适配器

pub mod analysis;
pub mod music;

pub use analysis::{
    FakeAnalysisClient, FakeAnalysisClientConfig, HttpAnalysisClient, HttpAnalysisClientConfig,
};
pub use music::{
    AppleMusicClient, AppleMusicClientConfig, FakeCatalogClient, SpotifyClient,
    SpotifyClientConfig, YoutubeMusicClient, YoutubeMusicClientConfig,
};
