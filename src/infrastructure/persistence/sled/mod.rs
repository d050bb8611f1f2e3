//! Sled 持久化

mod catalog_cache;

pub use catalog_cache::{SledCatalogCache, SledCacheConfig};
