//! Catalog Cache Port - 曲库搜索缓存
//!
//! 定义曲库搜索结果缓存的抽象接口，具体实现使用 Sled (LRU 缓存)

use async_trait::async_trait;
use thiserror::Error;

use super::music_catalog::CatalogTrack;
use crate::domain::user::MusicService;

/// Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache entry not found: {0}")]
    NotFound(String),

    #[error("Cache full, eviction failed")]
    EvictionFailed,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// Catalog Cache Port
///
/// 基于 service + 规范化 query 的 LRU 缓存
/// - 缓存 key: md5(normalized_query) + service
#[async_trait]
pub trait CatalogCachePort: Send + Sync {
    /// 存储搜索结果
    ///
    /// 自动执行 LRU 淘汰以保持缓存大小在限制内
    async fn put(&self, cache_key: &str, tracks: &[CatalogTrack]) -> Result<(), CacheError>;

    /// 根据缓存 key 获取搜索结果
    ///
    /// 同时更新 last_accessed 时间戳（LRU touch）
    async fn get(&self, cache_key: &str) -> Result<Option<Vec<CatalogTrack>>, CacheError>;

    /// 检查缓存是否存在
    async fn exists(&self, cache_key: &str) -> Result<bool, CacheError>;

    /// 删除缓存条目
    async fn remove(&self, cache_key: &str) -> Result<(), CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}

/// 生成缓存 key
///
/// 使用 md5(规范化 query) + service 作为缓存 key。
/// 规范化：小写、压缩空白。
pub fn generate_cache_key(service: MusicService, query: &str) -> String {
    let normalized = query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let digest = md5::compute(normalized.as_bytes());
    format!("{:x}:{}", digest, service.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_normalizes_whitespace_and_case() {
        let a = generate_cache_key(MusicService::Spotify, "Slow  Ambient   Piano");
        let b = generate_cache_key(MusicService::Spotify, "slow ambient piano");
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_differs_by_service() {
        let a = generate_cache_key(MusicService::Spotify, "slow ambient piano");
        let b = generate_cache_key(MusicService::AppleMusic, "slow ambient piano");
        assert_ne!(a, b);
        assert!(a.ends_with(":spotify"));
        assert!(b.ends_with(":apple-music"));
    }
}
