//! SQLite persistence backend using rusqlite.
//!
//! Lets the record manager run as a single process with no external server.
//! Uses WAL mode by default for concurrent read/write performance.
//!
//! # Example
//!
//! ```no_run
//! use user_store::{HashStore, SqliteStore};
//!
//! let store = SqliteStore::open("users.db").unwrap();
//! store.hash_write("user:a@x.com", &[("name", "A")]).unwrap();
//!
//! assert!(store.key_exists("user:a@x.com").unwrap());
//! ```

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::pattern::{glob_match, literal_prefix};
use crate::traits::{HashStore, RawFields, RawKey};

/// SQLite configuration options.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// SQLite journal mode. Defaults to WAL.
    pub journal_mode: JournalMode,
    /// Busy timeout in milliseconds. Defaults to 5000.
    pub busy_timeout_ms: u32,
    /// SQLite page size. Defaults to 4096.
    pub page_size: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5000,
            page_size: 4096,
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// Write-Ahead Logging. Readers proceed during writes.
    Wal,
    /// Traditional rollback journal.
    Delete,
    /// In-memory journal (fastest, no crash recovery).
    Memory,
}

impl JournalMode {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
            Self::Memory => "MEMORY",
        }
    }
}

/// Error type for the SQLite backend.
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    /// An error from rusqlite.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Lock poisoned.
    #[error("sqlite lock poisoned")]
    LockPoisoned,
}

/// SQLite persistence backend.
///
/// Wraps a `rusqlite::Connection` behind a `Mutex` for safe shared access.
/// Each field of a mapping is one row of `kv_hash`; a key exists while it
/// has at least one row. Creates the schema automatically on first open.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path with default config.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteError> {
        Self::open_with_config(path, SqliteConfig::default())
    }

    /// Open with custom configuration.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteConfig,
    ) -> Result<Self, SqliteError> {
        let conn = Connection::open(path)?;
        Self::init_connection(&conn, &config)?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn, &SqliteConfig::default())?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_connection(conn: &Connection, config: &SqliteConfig) -> Result<(), SqliteError> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = {};
             PRAGMA busy_timeout = {};
             PRAGMA page_size = {};
             PRAGMA synchronous = NORMAL;",
            config.journal_mode.as_str(),
            config.busy_timeout_ms,
            config.page_size,
        ))?;
        Ok(())
    }

    fn create_schema(conn: &Connection) -> Result<(), SqliteError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_hash (
                key         TEXT NOT NULL,
                field       BLOB NOT NULL,
                value       BLOB NOT NULL,
                PRIMARY KEY (key, field)
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteError> {
        self.conn.lock().map_err(|_| SqliteError::LockPoisoned)
    }

    /// Number of distinct keys stored, under any prefix.
    pub fn key_count(&self) -> Result<u64, SqliteError> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(DISTINCT key) FROM kv_hash", [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    /// Get the database file size in bytes (0 for in-memory).
    pub fn file_size(&self) -> Result<u64, SqliteError> {
        let conn = self.lock()?;
        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
        Ok((page_count * page_size) as u64)
    }

    /// Get the current journal mode.
    pub fn journal_mode(&self) -> Result<String, SqliteError> {
        let conn = self.lock()?;
        let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        Ok(mode)
    }
}

impl HashStore for SqliteStore {
    type Error = SqliteError;

    fn key_exists(&self, key: &str) -> Result<bool, Self::Error> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM kv_hash WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn hash_write(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM kv_hash WHERE key = ?1", params![key])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO kv_hash (key, field, value)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key, field) DO UPDATE SET value = excluded.value",
            )?;
            for (field, value) in fields {
                stmt.execute(params![key, field.as_bytes(), value.as_bytes()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn hash_read(&self, key: &str) -> Result<RawFields, Self::Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT field, value FROM kv_hash WHERE key = ?1")?;
        let fields = stmt
            .query_map(params![key], |row| {
                Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<Result<RawFields, _>>()?;
        Ok(fields)
    }

    fn key_delete(&self, key: &str) -> Result<u64, Self::Error> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM kv_hash WHERE key = ?1", params![key])?;
        Ok(u64::from(removed > 0))
    }

    fn key_scan(&self, pattern: &str) -> Result<Vec<RawKey>, Self::Error> {
        let conn = self.lock()?;
        // Narrow in SQL on the literal prefix, then apply the exact glob.
        let prefix = literal_prefix(pattern);
        let mut stmt = conn.prepare(
            "SELECT DISTINCT key FROM kv_hash
             WHERE substr(key, 1, length(?1)) = ?1",
        )?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .filter(|key| key.as_ref().map_or(true, |k| glob_match(pattern, k)))
            .map(|key| key.map(String::into_bytes))
            .collect::<Result<Vec<RawKey>, _>>()?;
        Ok(keys)
    }
}
