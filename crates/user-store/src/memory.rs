use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::pattern::glob_match;
use crate::traits::{HashStore, RawFields, RawKey};

/// In-memory storage backend.
///
/// All data lives in a `HashMap` behind a lock; nothing touches disk.
/// Ideal for testing and prototyping. Key enumeration order is unspecified,
/// like a real Redis `SCAN`.
///
/// # Example
///
/// ```
/// use user_store::{HashStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.hash_write("user:a@x.com", &[("name", "A")]).unwrap();
///
/// assert!(store.key_exists("user:a@x.com").unwrap());
/// assert_eq!(store.key_scan("user:*").unwrap(), vec![b"user:a@x.com".to_vec()]);
/// ```
pub struct MemoryStore {
    /// key -> field-mapping
    hashes: RwLock<HashMap<String, BTreeMap<Vec<u8>, Vec<u8>>>>,
    offline: AtomicBool,
}

/// Error type for the in-memory backend.
///
/// Only produced while the store is switched offline.
#[derive(Debug, Clone, thiserror::Error)]
#[error("MemoryStore error: {0}")]
pub struct MemoryError(String);

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            hashes: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Returns the number of keys currently held.
    pub fn key_count(&self) -> usize {
        self.hashes.read().len()
    }

    /// Simulate an unreachable store. While offline every primitive fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Store raw bytes under `key`, bypassing the text-only write path.
    ///
    /// Lets tests plant values a real server could hold but this crate
    /// never writes, such as non-UTF-8 field values.
    pub fn insert_raw(&self, key: &str, fields: RawFields) {
        self.hashes
            .write()
            .insert(key.to_string(), fields.into_iter().collect());
    }

    fn check_online(&self) -> Result<(), MemoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(MemoryError("store is offline".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HashStore for MemoryStore {
    type Error = MemoryError;

    fn key_exists(&self, key: &str) -> Result<bool, Self::Error> {
        self.check_online()?;
        Ok(self.hashes.read().contains_key(key))
    }

    fn hash_write(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), Self::Error> {
        self.check_online()?;
        let mut hashes = self.hashes.write();
        if fields.is_empty() {
            hashes.remove(key);
            return Ok(());
        }
        let mapping = fields
            .iter()
            .map(|(f, v)| (f.as_bytes().to_vec(), v.as_bytes().to_vec()))
            .collect();
        hashes.insert(key.to_string(), mapping);
        Ok(())
    }

    fn hash_read(&self, key: &str) -> Result<RawFields, Self::Error> {
        self.check_online()?;
        let fields = self
            .hashes
            .read()
            .get(key)
            .map(|mapping| {
                mapping
                    .iter()
                    .map(|(f, v)| (f.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(fields)
    }

    fn key_delete(&self, key: &str) -> Result<u64, Self::Error> {
        self.check_online()?;
        Ok(u64::from(self.hashes.write().remove(key).is_some()))
    }

    fn key_scan(&self, pattern: &str) -> Result<Vec<RawKey>, Self::Error> {
        self.check_online()?;
        let keys = self
            .hashes
            .read()
            .keys()
            .filter(|k| glob_match(pattern, k))
            .map(|k| k.as_bytes().to_vec())
            .collect();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(fields: RawFields) -> Vec<(String, String)> {
        let mut out: Vec<_> = fields
            .into_iter()
            .map(|(f, v)| {
                (
                    String::from_utf8(f).unwrap(),
                    String::from_utf8(v).unwrap(),
                )
            })
            .collect();
        out.sort();
        out
    }

    #[test]
    fn write_read_delete() {
        let store = MemoryStore::new();

        store
            .hash_write("k1", &[("name", "A"), ("email", "a@x.com")])
            .unwrap();
        assert!(store.key_exists("k1").unwrap());
        assert_eq!(
            text(store.hash_read("k1").unwrap()),
            vec![
                ("email".to_string(), "a@x.com".to_string()),
                ("name".to_string(), "A".to_string())
            ]
        );

        assert_eq!(store.key_delete("k1").unwrap(), 1);
        assert!(!store.key_exists("k1").unwrap());
        assert!(store.hash_read("k1").unwrap().is_empty());
    }

    #[test]
    fn write_replaces_whole_mapping() {
        let store = MemoryStore::new();
        store.hash_write("k", &[("a", "1"), ("b", "2")]).unwrap();
        store.hash_write("k", &[("a", "3")]).unwrap();

        assert_eq!(
            text(store.hash_read("k").unwrap()),
            vec![("a".to_string(), "3".to_string())]
        );
    }

    #[test]
    fn empty_write_leaves_key_absent() {
        let store = MemoryStore::new();
        store.hash_write("k", &[("a", "1")]).unwrap();
        store.hash_write("k", &[]).unwrap();
        assert!(!store.key_exists("k").unwrap());
    }

    #[test]
    fn delete_missing_key_removes_nothing() {
        let store = MemoryStore::new();
        assert_eq!(store.key_delete("nope").unwrap(), 0);
    }

    #[test]
    fn scan_filters_by_pattern() {
        let store = MemoryStore::new();
        store.hash_write("user:a", &[("n", "1")]).unwrap();
        store.hash_write("user:b", &[("n", "2")]).unwrap();
        store.hash_write("session:c", &[("n", "3")]).unwrap();

        let mut keys = store.key_scan("user:*").unwrap();
        keys.sort();
        assert_eq!(keys, vec![b"user:a".to_vec(), b"user:b".to_vec()]);
        assert_eq!(store.key_scan("*").unwrap().len(), 3);
        assert_eq!(store.key_count(), 3);
    }

    #[test]
    fn offline_store_fails_every_primitive() {
        let store = MemoryStore::new();
        store.hash_write("k", &[("a", "1")]).unwrap();
        store.set_offline(true);

        assert!(store.key_exists("k").is_err());
        assert!(store.hash_read("k").is_err());
        assert!(store.hash_write("k", &[("a", "2")]).is_err());
        assert!(store.key_delete("k").is_err());
        assert!(store.key_scan("*").is_err());

        store.set_offline(false);
        assert!(store.key_exists("k").unwrap());
    }
}
