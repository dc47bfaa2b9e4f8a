//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{PopeRecord, SpeechRecord, StoredPope, StoredSpeech, UpsertOutcome};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SPEECH_COLUMNS: &str = "_speech_id, pope_name, section, year, date, location, title, \
     language, url, text, entry_creation_date";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// Missing parent directories are created.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        let mut storage = Self { conn };
        storage.ensure_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let mut storage = Self { conn };
        storage.ensure_schema()?;
        Ok(storage)
    }

    fn query_speeches(
        &self,
        filter: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> StorageResult<Vec<StoredSpeech>> {
        let sql = format!(
            "SELECT {} FROM speeches WHERE {} ORDER BY date, _speech_id",
            SPEECH_COLUMNS, filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params, speech_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count_grouped(&self, column: &str) -> StorageResult<Vec<(String, u64)>> {
        let sql = format!(
            "SELECT COALESCE({col}, ''), COUNT(*) FROM speeches GROUP BY {col} \
             ORDER BY COUNT(*) DESC, {col}",
            col = column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn speech_from_row(row: &Row<'_>) -> rusqlite::Result<StoredSpeech> {
    Ok(StoredSpeech {
        id: row.get(0)?,
        speech: SpeechRecord {
            pope_name: text_column(row, 1)?,
            section: text_column(row, 2)?,
            year: text_column(row, 3)?,
            date: text_column(row, 4)?,
            location: text_column(row, 5)?,
            title: text_column(row, 6)?,
            language: text_column(row, 7)?,
            url: text_column(row, 8)?,
            text: text_column(row, 9)?,
        },
        entry_creation_date: text_column(row, 10)?,
    })
}

fn outcome(conn: &Connection, changed: usize) -> UpsertOutcome {
    if changed == 0 {
        UpsertOutcome::AlreadyExists
    } else {
        UpsertOutcome::Inserted(conn.last_insert_rowid())
    }
}

impl Storage for SqliteStorage {
    fn ensure_schema(&mut self) -> StorageResult<()> {
        initialize_schema(&self.conn)?;
        Ok(())
    }

    fn upsert_pope(&mut self, pope: &PopeRecord) -> StorageResult<UpsertOutcome> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO popes (pope_name, pope_slug, pope_number, secular_name, \
             place_of_birth, pontificate_begin, pontificate_end, entry_creation_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                pope.pope_name,
                pope.pope_slug,
                pope.pope_number,
                pope.secular_name,
                pope.place_of_birth,
                pope.pontificate_begin,
                pope.pontificate_end,
                now
            ],
        )?;
        Ok(outcome(&self.conn, changed))
    }

    fn upsert_speech(&mut self, speech: &SpeechRecord) -> StorageResult<UpsertOutcome> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO speeches (pope_name, section, year, date, location, title, \
             language, url, text, entry_creation_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                speech.pope_name,
                speech.section,
                speech.year,
                speech.date,
                speech.location,
                speech.title,
                speech.language,
                speech.url,
                speech.text,
                now
            ],
        )?;
        Ok(outcome(&self.conn, changed))
    }

    fn speech_url_exists(&self, url: &str) -> StorageResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM speeches WHERE url = ?1 LIMIT 1",
                params![url],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn list_popes(&self) -> StorageResult<Vec<StoredPope>> {
        let mut stmt = self.conn.prepare(
            "SELECT _pope_id, pope_name, pope_slug, pope_number, secular_name, place_of_birth, \
             pontificate_begin, pontificate_end, entry_creation_date FROM popes \
             ORDER BY CAST(pope_number AS INTEGER), pope_name",
        )?;

        let popes = stmt
            .query_map([], |row| {
                Ok(StoredPope {
                    id: row.get(0)?,
                    pope: PopeRecord {
                        pope_name: text_column(row, 1)?,
                        pope_slug: text_column(row, 2)?,
                        pope_number: text_column(row, 3)?,
                        secular_name: text_column(row, 4)?,
                        place_of_birth: text_column(row, 5)?,
                        pontificate_begin: text_column(row, 6)?,
                        pontificate_end: text_column(row, 7)?,
                    },
                    entry_creation_date: text_column(row, 8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(popes)
    }

    fn speeches_by_pope(&self, pope_name: &str) -> StorageResult<Vec<StoredSpeech>> {
        self.query_speeches("pope_name = ?1", &[&pope_name])
    }

    fn speeches_by_section(&self, section: &str) -> StorageResult<Vec<StoredSpeech>> {
        self.query_speeches("section = ?1", &[&section])
    }

    fn speeches_in_date_range(&self, from: &str, to: &str) -> StorageResult<Vec<StoredSpeech>> {
        self.query_speeches("date <> '' AND date BETWEEN ?1 AND ?2", &[&from, &to])
    }

    fn count_popes(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM popes", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_speeches(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM speeches", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_speeches_by_pope(&self) -> StorageResult<Vec<(String, u64)>> {
        self.count_grouped("pope_name")
    }

    fn count_speeches_by_section(&self) -> StorageResult<Vec<(String, u64)>> {
        self.count_grouped("section")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn speech(title: &str, date: &str, url: &str) -> SpeechRecord {
        SpeechRecord {
            pope_name: "Francis".to_string(),
            section: "homilies".to_string(),
            year: "2020".to_string(),
            date: date.to_string(),
            location: "Saint Peter's Basilica".to_string(),
            title: title.to_string(),
            language: "EN".to_string(),
            url: url.to_string(),
            text: "Dear brothers and sisters".to_string(),
        }
    }

    fn francis() -> PopeRecord {
        PopeRecord {
            pope_name: "Francis".to_string(),
            pope_slug: "francesco".to_string(),
            pope_number: "266".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_new_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("speeches.db");

        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.count_speeches().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("speeches.db");

        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            storage
                .upsert_speech(&speech("Easter Vigil", "2020-04-11", "u1"))
                .unwrap();
        }

        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.count_speeches().unwrap(), 1);
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.ensure_schema().unwrap();
        storage.ensure_schema().unwrap();
    }

    #[test]
    fn test_upsert_speech_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let record = speech("Easter Vigil", "2020-04-11", "https://example.org/a.html");

        let first = storage.upsert_speech(&record).unwrap();
        let second = storage.upsert_speech(&record).unwrap();

        assert!(matches!(first, UpsertOutcome::Inserted(id) if id > 0));
        assert_eq!(second, UpsertOutcome::AlreadyExists);
        assert_eq!(storage.count_speeches().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_key_keeps_first_write() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let original = speech("Easter Vigil", "2020-04-11", "https://example.org/en.html");
        let mut other = original.clone();
        other.url = "https://example.org/it.html".to_string();
        other.text = "Cari fratelli e sorelle".to_string();

        storage.upsert_speech(&original).unwrap();
        assert_eq!(
            storage.upsert_speech(&other).unwrap(),
            UpsertOutcome::AlreadyExists
        );

        let stored = storage.speeches_by_pope("Francis").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].speech, original);
    }

    #[test]
    fn test_same_title_on_different_dates_are_distinct() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_speech(&speech("General Audience", "2020-01-08", "a"))
            .unwrap();
        storage
            .upsert_speech(&speech("General Audience", "2020-01-15", "b"))
            .unwrap();
        assert_eq!(storage.count_speeches().unwrap(), 2);
    }

    #[test]
    fn test_upsert_pope() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        assert!(storage.upsert_pope(&francis()).unwrap().is_inserted());
        assert_eq!(
            storage.upsert_pope(&francis()).unwrap(),
            UpsertOutcome::AlreadyExists
        );

        let popes = storage.list_popes().unwrap();
        assert_eq!(popes.len(), 1);
        assert_eq!(popes[0].pope, francis());
        assert!(!popes[0].entry_creation_date.is_empty());
    }

    #[test]
    fn test_pope_without_number_is_still_unique() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let unknown = PopeRecord {
            pope_name: "Gregory".to_string(),
            pope_slug: "gregory".to_string(),
            ..Default::default()
        };

        storage.upsert_pope(&unknown).unwrap();
        assert_eq!(
            storage.upsert_pope(&unknown).unwrap(),
            UpsertOutcome::AlreadyExists
        );
        assert_eq!(storage.count_popes().unwrap(), 1);
    }

    #[test]
    fn test_speech_url_exists() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_speech(&speech("Easter Vigil", "2020-04-11", "https://example.org/a.html"))
            .unwrap();

        assert!(storage.speech_url_exists("https://example.org/a.html").unwrap());
        assert!(!storage.speech_url_exists("https://example.org/b.html").unwrap());
    }

    #[test]
    fn test_read_queries() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_speech(&speech("Palm Sunday", "2020-04-05", "a"))
            .unwrap();
        storage
            .upsert_speech(&speech("Easter Vigil", "2020-04-11", "b"))
            .unwrap();
        storage.upsert_speech(&speech("Undated", "", "c")).unwrap();
        let mut audience = speech("General Audience", "2020-04-08", "d");
        audience.section = "audiences".to_string();
        storage.upsert_speech(&audience).unwrap();

        let homilies = storage.speeches_by_section("homilies").unwrap();
        assert_eq!(homilies.len(), 3);

        let april: Vec<String> = storage
            .speeches_in_date_range("2020-04-01", "2020-04-08")
            .unwrap()
            .into_iter()
            .map(|s| s.speech.title)
            .collect();
        assert_eq!(april, vec!["Palm Sunday", "General Audience"]);

        assert_eq!(
            storage.count_speeches_by_section().unwrap(),
            vec![("homilies".to_string(), 3), ("audiences".to_string(), 1)]
        );
        assert_eq!(
            storage.count_speeches_by_pope().unwrap(),
            vec![("Francis".to_string(), 4)]
        );
    }

    #[test]
    fn test_final_state_is_order_independent() {
        let records = vec![
            speech("Palm Sunday", "2020-04-05", "a"),
            speech("Easter Vigil", "2020-04-11", "b"),
            speech("Palm Sunday", "2020-04-05", "a-duplicate"),
            speech("Pentecost", "2020-05-31", "c"),
        ];

        let mut forward = SqliteStorage::new_in_memory().unwrap();
        for record in &records {
            forward.upsert_speech(record).unwrap();
        }
        let mut backward = SqliteStorage::new_in_memory().unwrap();
        for record in records.iter().rev() {
            backward.upsert_speech(record).unwrap();
        }

        let keys = |storage: &SqliteStorage| -> Vec<(String, String)> {
            let mut keys: Vec<_> = storage
                .speeches_by_pope("Francis")
                .unwrap()
                .into_iter()
                .map(|s| (s.speech.title, s.speech.date))
                .collect();
            keys.sort();
            keys
        };

        assert_eq!(keys(&forward), keys(&backward));
        assert_eq!(forward.count_speeches().unwrap(), 3);
    }
}
