//! Database schema of the page cache

/// SQL schema for a per-domain cache database
pub const SCHEMA_SQL: &str = r#"
-- One row per cached page, keyed by normalized URL
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    page TEXT NOT NULL,
    cached_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
