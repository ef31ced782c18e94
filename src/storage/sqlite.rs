//! SQLite cache implementation
//!
//! Pages are stored as JSON documents, one row per normalized URL.

use crate::page::Page;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CacheResult, CacheStore};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite cache backend
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Opens or creates a cache database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn open(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory cache, gone when dropped
    pub fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Gets the cached page of one URL
    pub fn get(&self, url: &str) -> CacheResult<Option<Page>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT page FROM pages WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

impl CacheStore for SqliteCache {
    fn contains(&self, url: &str) -> CacheResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM pages WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    fn get_all(&self) -> CacheResult<Vec<Page>> {
        let mut stmt = self.conn.prepare("SELECT page FROM pages ORDER BY url")?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut pages = Vec::new();
        for json in rows {
            pages.push(serde_json::from_str(&json?)?);
        }

        Ok(pages)
    }

    fn put(&mut self, url: &str, page: &Page) -> CacheResult<()> {
        let json = serde_json::to_string(page)?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO pages (url, page, cached_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET page = excluded.page, cached_at = excluded.cached_at",
            params![url, json, now],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> CacheResult<usize> {
        let removed = self.conn.execute("DELETE FROM pages", [])?;
        Ok(removed)
    }

    fn len(&self) -> CacheResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
