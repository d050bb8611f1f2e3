//! Sled-based LRU Catalog Cache Implementation

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{CacheError, CacheStats, CatalogCachePort, CatalogTrack};

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: String,
    /// 最大缓存大小（字节）
    pub max_size_bytes: u64,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/catalog_cache.sled".to_string(),
            max_size_bytes: 256 * 1024 * 1024, // 256MB
        }
    }
}

/// 内部缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InternalCacheEntry {
    tracks: Vec<CatalogTrack>,
    size_bytes: u64,
    last_accessed: i64,
    created_at: i64,
}

/// Sled 曲库搜索缓存
pub struct SledCatalogCache {
    db: Db,
    max_size_bytes: u64,
    current_size: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl SledCatalogCache {
    /// 创建新的缓存实例
    pub fn new(config: &SledCacheConfig) -> Result<Self, CacheError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        // 计算当前缓存大小
        let current_size = Self::calculate_total_size(&db)?;

        tracing::info!(
            db_path = %config.db_path,
            max_size_bytes = config.max_size_bytes,
            current_size = current_size,
            "SledCatalogCache initialized"
        );

        Ok(Self {
            db,
            max_size_bytes: config.max_size_bytes,
            current_size: AtomicU64::new(current_size),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        })
    }

    /// 打开现有缓存
    pub fn open<P: AsRef<Path>>(path: P, max_size_bytes: u64) -> Result<Self, CacheError> {
        let config = SledCacheConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
            max_size_bytes,
        };
        Self::new(&config)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 计算数据库中所有条目的总大小
    fn calculate_total_size(db: &Db) -> Result<u64, CacheError> {
        let mut total = 0u64;
        for item in db.scan_prefix("cache:") {
            let (_, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                total += entry.size_bytes;
            }
        }
        Ok(total)
    }

    /// LRU 淘汰
    fn evict_lru(&self) -> Result<(), CacheError> {
        let mut oldest: Option<(String, InternalCacheEntry)> = None;

        for item in self.db.scan_prefix("cache:") {
            let (key, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                let is_older = oldest
                    .as_ref()
                    .map(|(_, e)| entry.last_accessed < e.last_accessed)
                    .unwrap_or(true);

                if is_older {
                    let key_str = String::from_utf8(key.to_vec())
                        .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                    oldest = Some((key_str, entry));
                }
            }
        }

        if let Some((key, entry)) = oldest {
            self.db
                .remove(&key)
                .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

            self.current_size.fetch_sub(entry.size_bytes, Ordering::Relaxed);
            tracing::debug!(
                key = %key,
                size_bytes = entry.size_bytes,
                "LRU evicted cache entry"
            );
        }

        Ok(())
    }

    /// 刷新数据库
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn db_key(cache_key: &str) -> String {
        format!("cache:{}", cache_key)
    }
}

#[async_trait]
impl CatalogCachePort for SledCatalogCache {
    async fn put(&self, cache_key: &str, tracks: &[CatalogTrack]) -> Result<(), CacheError> {
        let now = Utc::now().timestamp();
        let serialized_tracks = bincode::serialize(tracks)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;
        let size_bytes = serialized_tracks.len() as u64;

        let entry = InternalCacheEntry {
            tracks: tracks.to_vec(),
            size_bytes,
            last_accessed: now,
            created_at: now,
        };

        // 覆盖写先移除旧条目并扣掉其大小
        if let Ok(Some(old)) = self.db.remove(Self::db_key(cache_key)) {
            if let Ok(old_entry) = bincode::deserialize::<InternalCacheEntry>(&old) {
                self.current_size
                    .fetch_sub(old_entry.size_bytes, Ordering::Relaxed);
            }
        }

        // 超限时先淘汰
        while self.current_size.load(Ordering::Relaxed) + size_bytes > self.max_size_bytes {
            let before = self.current_size.load(Ordering::Relaxed);
            self.evict_lru()?;
            if self.current_size.load(Ordering::Relaxed) == before {
                // 没有可淘汰的条目
                return Err(CacheError::EvictionFailed);
            }
        }

        let serialized = bincode::serialize(&entry)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        self.db
            .insert(Self::db_key(cache_key), serialized)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        self.current_size.fetch_add(size_bytes, Ordering::Relaxed);
        Ok(())
    }

    async fn get(&self, cache_key: &str) -> Result<Option<Vec<CatalogTrack>>, CacheError> {
        let db_key = Self::db_key(cache_key);
        let value = self
            .db
            .get(&db_key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        let Some(value) = value else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        let mut entry: InternalCacheEntry = bincode::deserialize(&value)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        // LRU touch
        entry.last_accessed = Utc::now().timestamp();
        let serialized = bincode::serialize(&entry)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;
        self.db
            .insert(&db_key, serialized)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        self.hit_count.fetch_add(1, Ordering::Relaxed);
        Ok(Some(entry.tracks))
    }

    async fn exists(&self, cache_key: &str) -> Result<bool, CacheError> {
        self.db
            .contains_key(Self::db_key(cache_key))
            .map_err(|e| CacheError::DatabaseError(e.to_string()))
    }

    async fn remove(&self, cache_key: &str) -> Result<(), CacheError> {
        let removed = self
            .db
            .remove(Self::db_key(cache_key))
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        if let Some(value) = removed {
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                self.current_size.fetch_sub(entry.size_bytes, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let total_entries = self.db.scan_prefix("cache:").count();
        CacheStats {
            total_entries,
            total_size_bytes: self.current_size.load(Ordering::Relaxed),
            max_size_bytes: self.max_size_bytes,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cache(max_size_bytes: u64) -> (SledCatalogCache, TempDir) {
        let dir = TempDir::new().unwrap();
        let cache = SledCatalogCache::open(dir.path().join("cache.sled"), max_size_bytes).unwrap();
        (cache, dir)
    }

    fn sample_tracks(n: usize) -> Vec<CatalogTrack> {
        (0..n)
            .map(|i| CatalogTrack {
                title: format!("Track {}", i),
                artist: "Artist".to_string(),
                album: None,
                duration_secs: 200,
                external_id: format!("ext-{}", i),
                is_instrumental: Some(true),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let (cache, _dir) = test_cache(1024 * 1024);
        let tracks = sample_tracks(3);

        cache.put("key-1", &tracks).await.unwrap();
        let fetched = cache.get("key-1").await.unwrap().unwrap();
        assert_eq!(fetched.len(), 3);
        assert_eq!(fetched[0].external_id, "ext-0");
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let (cache, _dir) = test_cache(1024 * 1024);
        assert!(cache.get("missing").await.unwrap().is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 0);
    }

    #[tokio::test]
    async fn test_remove_frees_size() {
        let (cache, _dir) = test_cache(1024 * 1024);
        cache.put("key-1", &sample_tracks(2)).await.unwrap();

        let before = cache.stats().await.total_size_bytes;
        assert!(before > 0);

        cache.remove("key-1").await.unwrap();
        assert_eq!(cache.stats().await.total_size_bytes, 0);
        assert!(cache.get("key-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lru_eviction_under_pressure() {
        // 缓存上限只够两个条目，第三次插入触发淘汰
        let tracks = sample_tracks(5);
        let entry_size = bincode::serialize(&tracks).unwrap().len() as u64;
        let (cache, _dir) = test_cache(entry_size * 2 + entry_size / 2);

        cache.put("old", &tracks).await.unwrap();
        cache.put("new-1", &tracks).await.unwrap();
        cache.put("new-2", &tracks).await.unwrap();
        cache.put("new-3", &tracks).await.unwrap();

        let stats = cache.stats().await;
        assert_eq!(stats.total_entries, 2);
        assert!(stats.total_size_bytes <= entry_size * 2 + entry_size / 2);
    }

    #[tokio::test]
    async fn test_overwrite_does_not_double_count() {
        let (cache, _dir) = test_cache(1024 * 1024);
        let tracks = sample_tracks(3);

        cache.put("key-1", &tracks).await.unwrap();
        let first = cache.stats().await.total_size_bytes;

        cache.put("key-1", &tracks).await.unwrap();
        assert_eq!(cache.stats().await.total_size_bytes, first);
    }
}
