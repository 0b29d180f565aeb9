//! Storage layer for travelmemory.
//!
//! This module provides `SQLite`-based persistent storage for travel memories.
//! The save pipeline writes through the narrow [`MemoryStore`] trait; the CLI
//! reads back through [`Storage`] directly.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::memory::TravelMemory;

/// Where the save pipeline creates and commits records.
pub trait MemoryStore {
    /// Persist `memory` and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be committed.
    fn insert(&self, memory: &TravelMemory) -> Result<i64>;
}

impl<S: MemoryStore + ?Sized> MemoryStore for &S {
    fn insert(&self, memory: &TravelMemory) -> Result<i64> {
        (**self).insert(memory)
    }
}

/// Storage engine for travel memories.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a memory by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<TravelMemory>> {
        let memory = self
            .conn
            .query_row(
                r"
                SELECT id, video_url, latitude, longitude, created_at
                FROM travel_memories WHERE id = ?1
                ",
                [id],
                Self::row_to_memory,
            )
            .optional()?;
        Ok(memory)
    }

    /// Get the most recent memories, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_recent(&self, limit: usize) -> Result<Vec<TravelMemory>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, video_url, latitude, longitude, created_at
            FROM travel_memories ORDER BY created_at DESC, id DESC LIMIT ?1
            ",
        )?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let memories = stmt
            .query_map([limit_i64], Self::row_to_memory)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(memories)
    }

    /// Count stored memories.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM travel_memories", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_memories = self.count()?;

        let (oldest, newest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM travel_memories",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_memories,
            oldest_memory: oldest.as_deref().and_then(parse_timestamp),
            newest_memory: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }

    /// Convert a database row to a `TravelMemory`.
    fn row_to_memory(row: &rusqlite::Row) -> rusqlite::Result<TravelMemory> {
        let id: i64 = row.get(0)?;
        let created_at_str: String = row.get(4)?;

        let created_at = parse_timestamp(&created_at_str).unwrap_or_else(|| {
            warn!(
                "Memory {} has unreadable created_at '{}'",
                id, created_at_str
            );
            DateTime::<Utc>::UNIX_EPOCH
        });

        Ok(TravelMemory {
            id: Some(id),
            video_url: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            created_at,
        })
    }
}

impl MemoryStore for Storage {
    fn insert(&self, memory: &TravelMemory) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO travel_memories (video_url, latitude, longitude, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                memory.video_url,
                memory.latitude,
                memory.longitude,
                memory.created_at.to_rfc3339(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted travel memory with id {}", id);
        Ok(id)
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of memories stored.
    pub total_memories: i64,
    /// Creation time of the oldest memory.
    pub oldest_memory: Option<DateTime<Utc>>,
    /// Creation time of the newest memory.
    pub newest_memory: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationSample;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn create_test_memory(url: &str, lat: f64, lon: f64) -> TravelMemory {
        TravelMemory::new(url, &LocationSample::new(lat, lon))
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let memory = create_test_memory("file:///tmp/clip.mov", 45.0, -75.0);

        let id = storage.insert(&memory).unwrap();
        let retrieved = storage.get(id).unwrap().unwrap();

        assert_eq!(retrieved.id, Some(id));
        assert_eq!(retrieved.video_url, "file:///tmp/clip.mov");
        assert_eq!(retrieved.coordinates(), (45.0, -75.0));
    }

    #[test]
    fn test_coordinates_round_trip_exactly() {
        let storage = create_test_storage();
        let memory = create_test_memory("file:///x.mp4", 48.858_370_1, 2.294_481_3);

        let id = storage.insert(&memory).unwrap();
        let retrieved = storage.get(id).unwrap().unwrap();

        assert_eq!(retrieved.latitude.to_bits(), memory.latitude.to_bits());
        assert_eq!(retrieved.longitude.to_bits(), memory.longitude.to_bits());
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get(99999).unwrap().is_none());
    }

    #[test]
    fn test_get_recent_newest_first() {
        let storage = create_test_storage();
        for i in 0..5 {
            let mut memory = create_test_memory(&format!("file:///clip{i}.mp4"), 0.0, 0.0);
            memory.created_at = DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(i);
            storage.insert(&memory).unwrap();
        }

        let recent = storage.get_recent(3).unwrap();
        let urls: Vec<_> = recent.iter().map(|m| m.video_url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["file:///clip4.mp4", "file:///clip3.mp4", "file:///clip2.mp4"]
        );
    }

    #[test]
    fn test_get_recent_with_zero_limit() {
        let storage = create_test_storage();
        storage
            .insert(&create_test_memory("file:///a.mp4", 0.0, 0.0))
            .unwrap();
        assert!(storage.get_recent(0).unwrap().is_empty());
    }

    #[test]
    fn test_count() {
        let storage = create_test_storage();
        assert_eq!(storage.count().unwrap(), 0);

        storage
            .insert(&create_test_memory("file:///a.mp4", 0.0, 0.0))
            .unwrap();
        storage
            .insert(&create_test_memory("file:///b.mp4", 0.0, 0.0))
            .unwrap();

        assert_eq!(storage.count().unwrap(), 2);
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats.total_memories, 0);
        assert!(stats.oldest_memory.is_none());
        assert!(stats.newest_memory.is_none());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        let mut older = create_test_memory("file:///a.mp4", 0.0, 0.0);
        older.created_at = DateTime::<Utc>::UNIX_EPOCH;
        storage.insert(&older).unwrap();
        storage
            .insert(&create_test_memory("file:///b.mp4", 0.0, 0.0))
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_memories, 2);
        assert_eq!(stats.oldest_memory, Some(DateTime::<Utc>::UNIX_EPOCH));
        assert!(stats.newest_memory.unwrap() > DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested/deeper/memories.db");

        let storage = Storage::open(&db_path).unwrap();
        storage
            .insert(&create_test_memory("file:///a.mp4", 1.0, 2.0))
            .unwrap();

        assert!(db_path.exists());
        assert_eq!(storage.path(), db_path);
        assert!(storage.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_reopen_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("memories.db");

        {
            let storage = Storage::open(&db_path).unwrap();
            storage
                .insert(&create_test_memory("file:///a.mp4", 1.0, 2.0))
                .unwrap();
        }

        let storage = Storage::open(&db_path).unwrap();
        assert_eq!(storage.count().unwrap(), 1);
    }
}
