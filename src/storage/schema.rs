//! Database schema definitions
//!
//! The two tables and their column sets are shared with other tools reading
//! the same database file, so columns are only ever added, never renamed.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per pope, reference data
CREATE TABLE IF NOT EXISTS popes (
    _pope_id INTEGER PRIMARY KEY,
    pope_name TEXT,
    pope_slug TEXT,
    pope_number TEXT,
    secular_name TEXT,
    place_of_birth TEXT,
    pontificate_begin TEXT,
    pontificate_end TEXT,
    entry_creation_date TEXT,
    UNIQUE(pope_name, pope_number)
);

-- One row per harvested document
CREATE TABLE IF NOT EXISTS speeches (
    _speech_id INTEGER PRIMARY KEY,
    pope_name TEXT,
    section TEXT,
    year TEXT,
    date TEXT,
    location TEXT,
    title TEXT,
    language TEXT,
    url TEXT,
    text TEXT,
    entry_creation_date TEXT,
    UNIQUE(pope_name, title, date)
);

CREATE INDEX IF NOT EXISTS idx_speeches_url ON speeches(url);
CREATE INDEX IF NOT EXISTS idx_speeches_pope_section ON speeches(pope_name, section);
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
