//! Cache traits and error types

use crate::page::Page;
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// A persistent store of pages from earlier runs, keyed by normalized URL
///
/// One store holds the pages of one domain. The crawler reads it during
/// delta crawls and writes every result page into it after a run.
pub trait CacheStore {
    /// Returns true if a page is cached under this URL
    fn contains(&self, url: &str) -> CacheResult<bool>;

    /// Returns every cached page
    fn get_all(&self) -> CacheResult<Vec<Page>>;

    /// Stores a page, replacing any earlier entry for the URL
    fn put(&mut self, url: &str, page: &Page) -> CacheResult<()>;

    /// Removes every entry and returns how many there were
    fn clear(&mut self) -> CacheResult<usize>;

    /// Number of cached pages
    fn len(&self) -> CacheResult<usize>;

    fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}
