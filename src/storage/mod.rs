//! Storage module for the persistent page cache
//!
//! This module handles all database operations for the cache, including:
//! - SQLite database initialization and schema management
//! - Page lookup for delta crawls
//! - Storing pages after a run

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCache;
pub use traits::{CacheError, CacheResult, CacheStore};

use std::path::{Path, PathBuf};

/// Path of the cache database of a domain inside `cache_dir`
///
/// A port separator in the domain is replaced so the name is valid on every
/// platform: `127.0.0.1:8080` is stored as `127.0.0.1_8080.sqlite`.
pub fn cache_path(cache_dir: &Path, domain: &str) -> PathBuf {
    cache_dir.join(format!("{}.sqlite", domain.replace(':', "_")))
}

/// Opens (creating if needed) the cache database of a domain
pub fn open_cache(cache_dir: &Path, domain: &str) -> CacheResult<SqliteCache> {
    std::fs::create_dir_all(cache_dir)?;
    SqliteCache::open(&cache_path(cache_dir, domain))
}
