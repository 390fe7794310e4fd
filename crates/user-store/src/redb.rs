//! Pure-Rust key-value backend using [`redb`](https://docs.rs/redb).
//!
//! No C dependencies and no server to run. Each key maps to its whole
//! field-mapping, encoded with postcard, so a write replaces the mapping in
//! a single insert.
//!
//! Enable with `features = ["redb"]`.
//!
//! ```no_run
//! use user_store::{HashStore, RedbStore};
//!
//! let store = RedbStore::open("/tmp/users.redb").unwrap();
//! store.hash_write("user:a@x.com", &[("name", "A")]).unwrap();
//! ```

use std::path::Path;

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::pattern::{glob_match, literal_prefix};
use crate::traits::{HashStore, RawFields, RawKey};

// ── Table definitions ───────────────────────────────────────────────

const HASH_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv_hash");

// ── Error type ──────────────────────────────────────────────────────

/// Errors returned by [`RedbStore`] operations.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RedbError(String);

fn err(e: impl std::fmt::Display) -> RedbError {
    RedbError(e.to_string())
}

// ── Store ───────────────────────────────────────────────────────────

/// A pure-Rust persistence backend built on [`redb`].
///
/// All writes are atomic (each operation runs in its own redb transaction).
/// Keys are kept sorted, so scans with a literal prefix become range reads.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RedbError> {
        let db = Database::create(path).map_err(err)?;
        Self::init(db)
    }

    /// Create an in-memory redb database (for testing).
    pub fn open_in_memory() -> Result<Self, RedbError> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(err)?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, RedbError> {
        // Ensure the table exists by opening a write txn.
        let txn = db.begin_write().map_err(err)?;
        txn.open_table(HASH_TABLE).map_err(err)?;
        txn.commit().map_err(err)?;
        Ok(Self { db })
    }

    /// Number of keys stored, under any prefix.
    pub fn key_count(&self) -> Result<u64, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(HASH_TABLE).map_err(err)?;
        table.len().map_err(err)
    }
}

// ── HashStore ───────────────────────────────────────────────────────

impl HashStore for RedbStore {
    type Error = RedbError;

    fn key_exists(&self, key: &str) -> Result<bool, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(HASH_TABLE).map_err(err)?;
        let exists = table.get(key).map_err(err)?.is_some();
        Ok(exists)
    }

    fn hash_write(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), RedbError> {
        let txn = self.db.begin_write().map_err(err)?;
        {
            let mut table = txn.open_table(HASH_TABLE).map_err(err)?;
            if fields.is_empty() {
                table.remove(key).map_err(err)?;
            } else {
                let value = encode_fields(fields)?;
                table.insert(key, value.as_slice()).map_err(err)?;
            }
        }
        txn.commit().map_err(err)?;
        Ok(())
    }

    fn hash_read(&self, key: &str) -> Result<RawFields, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(HASH_TABLE).map_err(err)?;
        let fields = match table.get(key).map_err(err)? {
            Some(guard) => decode_fields(guard.value())?,
            None => Vec::new(),
        };
        Ok(fields)
    }

    fn key_delete(&self, key: &str) -> Result<u64, RedbError> {
        let txn = self.db.begin_write().map_err(err)?;
        let removed = {
            let mut table = txn.open_table(HASH_TABLE).map_err(err)?;
            let removed = table.remove(key).map_err(err)?;
            removed.is_some()
        };
        txn.commit().map_err(err)?;
        Ok(u64::from(removed))
    }

    fn key_scan(&self, pattern: &str) -> Result<Vec<RawKey>, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(HASH_TABLE).map_err(err)?;

        let prefix = literal_prefix(pattern);
        let range = table.range(prefix.as_str()..).map_err(err)?;

        let mut keys = Vec::new();
        for item in range {
            let (key_guard, _) = item.map_err(err)?;
            let key = key_guard.value();
            if !key.starts_with(prefix.as_str()) {
                break;
            }
            if glob_match(pattern, key) {
                keys.push(key.as_bytes().to_vec());
            }
        }
        Ok(keys)
    }
}

// ── Value encoding helpers ──────────────────────────────────────────

fn encode_fields(fields: &[(&str, &str)]) -> Result<Vec<u8>, RedbError> {
    let raw: RawFields = fields
        .iter()
        .map(|(f, v)| (f.as_bytes().to_vec(), v.as_bytes().to_vec()))
        .collect();
    postcard::to_allocvec(&raw).map_err(err)
}

fn decode_fields(value: &[u8]) -> Result<RawFields, RedbError> {
    postcard::from_bytes(value).map_err(err)
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn new_store() -> RedbStore {
        RedbStore::open_in_memory().unwrap()
    }

    #[test]
    fn write_read_delete() {
        let store = new_store();
        store
            .hash_write("k1", &[("name", "A"), ("email", "a@x.com")])
            .unwrap();
        assert!(store.key_exists("k1").unwrap());
        assert_eq!(
            store.hash_read("k1").unwrap(),
            vec![
                (b"name".to_vec(), b"A".to_vec()),
                (b"email".to_vec(), b"a@x.com".to_vec()),
            ]
        );

        assert_eq!(store.key_delete("k1").unwrap(), 1);
        assert!(!store.key_exists("k1").unwrap());
        assert_eq!(store.key_delete("k1").unwrap(), 0);
        assert!(store.hash_read("k1").unwrap().is_empty());
    }

    #[test]
    fn write_replaces_whole_mapping() {
        let store = new_store();
        store.hash_write("k", &[("a", "1"), ("b", "2")]).unwrap();
        store.hash_write("k", &[("a", "3")]).unwrap();
        assert_eq!(
            store.hash_read("k").unwrap(),
            vec![(b"a".to_vec(), b"3".to_vec())]
        );
    }

    #[test]
    fn empty_write_leaves_key_absent() {
        let store = new_store();
        store.hash_write("k", &[("a", "1")]).unwrap();
        store.hash_write("k", &[]).unwrap();
        assert!(!store.key_exists("k").unwrap());
    }

    #[test]
    fn scan_stops_at_end_of_prefix() {
        let store = new_store();
        store.hash_write("user:b", &[("n", "2")]).unwrap();
        store.hash_write("user:a", &[("n", "1")]).unwrap();
        store.hash_write("users", &[("n", "x")]).unwrap();
        store.hash_write("session:c", &[("n", "3")]).unwrap();
        store.hash_write("zzz", &[("n", "4")]).unwrap();

        let keys = store.key_scan("user:*").unwrap();
        assert_eq!(keys, vec![b"user:a".to_vec(), b"user:b".to_vec()]); // sorted by redb
        assert_eq!(store.key_scan("*").unwrap().len(), 5);
        assert_eq!(store.key_scan("*:?").unwrap().len(), 3);
        assert_eq!(store.key_count().unwrap(), 5);
    }

    #[test]
    fn open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.hash_write("k", &[("f", "value")]).unwrap();
        }
        // Reopen
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(
            store.hash_read("k").unwrap(),
            vec![(b"f".to_vec(), b"value".to_vec())]
        );
    }
}
