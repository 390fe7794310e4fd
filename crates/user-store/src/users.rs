//! The record adapter: user CRUD on top of any [`HashStore`].
//!
//! `UserStore` maps a user to one field-mapping stored under the Record Key
//! `"user:" + email`. Create, read and update check existence first; delete
//! removes unconditionally and checks the removed count afterwards.
//!
//! Nothing is cached between calls and no two primitives are composed under
//! a lock, so concurrent creates of the same email can both succeed (last
//! writer wins).
//!
//! # Example
//!
//! ```
//! use user_store::{MemoryStore, UserStore};
//!
//! let users = UserStore::new(MemoryStore::new());
//! users.create("Ada", "ada@example.com").unwrap();
//!
//! let record = users.read("ada@example.com").unwrap();
//! assert_eq!(record["name"], "Ada");
//! assert!(users.create("Eve", "ada@example.com").unwrap_err().is_already_exists());
//! ```

use tracing::{debug, info, warn};

use crate::error::{Result, UserStoreError};
use crate::pattern;
use crate::traits::{HashStore, RawFields, RawKey};
use crate::types::{FieldMap, User};

/// The default Record Key prefix.
pub const DEFAULT_KEY_PREFIX: &str = "user:";

/// Configuration for `UserStore`.
#[derive(Debug, Clone)]
pub struct UserStoreConfig {
    /// Prefix prepended to the email to form the Record Key.
    pub key_prefix: String,
}

impl Default for UserStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

/// Builder for constructing a `UserStore` with custom configuration.
pub struct UserStoreBuilder<S: HashStore> {
    store: S,
    config: UserStoreConfig,
}

impl<S: HashStore> UserStoreBuilder<S> {
    /// Set the Record Key prefix.
    pub fn key_prefix(mut self, prefix: &str) -> Self {
        self.config.key_prefix = prefix.to_string();
        self
    }

    /// Build the `UserStore`.
    pub fn build(self) -> UserStore<S> {
        UserStore::with_config(self.store, self.config)
    }
}

/// User records persisted in a [`HashStore`].
///
/// The store client is injected, so tests substitute [`MemoryStore`](crate::MemoryStore)
/// and production passes a Redis, SQLite or redb backend.
pub struct UserStore<S: HashStore> {
    store: S,
    config: UserStoreConfig,
    scan_pattern: String,
}

impl<S: HashStore> UserStore<S> {
    /// Create a `UserStore` over `store` with the default `"user:"` prefix.
    pub fn new(store: S) -> Self {
        Self::with_config(store, UserStoreConfig::default())
    }

    /// Create a builder for advanced configuration.
    pub fn builder(store: S) -> UserStoreBuilder<S> {
        UserStoreBuilder {
            store,
            config: UserStoreConfig::default(),
        }
    }

    fn with_config(store: S, config: UserStoreConfig) -> Self {
        let scan_pattern = format!("{}*", pattern::escape(&config.key_prefix));
        Self {
            store,
            config,
            scan_pattern,
        }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the active configuration.
    pub fn config(&self) -> &UserStoreConfig {
        &self.config
    }

    /// The Record Key for `email`.
    pub fn record_key(&self, email: &str) -> String {
        format!("{}{}", self.config.key_prefix, email)
    }

    /// Glob pattern matching every Record Key.
    pub fn scan_pattern(&self) -> &str {
        &self.scan_pattern
    }

    /// Check whether a record exists for `email`.
    pub fn exists(&self, email: &str) -> Result<bool> {
        let key = self.record_key(email);
        self.key_exists(&key)
    }

    /// Create a record. Fails with `AlreadyExists` if one is present.
    pub fn create(&self, name: &str, email: &str) -> Result<()> {
        let key = self.record_key(email);
        if self.key_exists(&key)? {
            debug!(%key, "create rejected, record exists");
            return Err(UserStoreError::AlreadyExists {
                email: email.to_string(),
            });
        }
        self.write(&key, name, email)?;
        info!(%key, "user created");
        Ok(())
    }

    /// Create a record from a [`User`].
    pub fn create_user(&self, user: &User) -> Result<()> {
        self.create(&user.name, &user.email)
    }

    /// Read the stored field-mapping. Fails with `NotFound` if absent.
    pub fn read(&self, email: &str) -> Result<FieldMap> {
        let key = self.record_key(email);
        if !self.key_exists(&key)? {
            debug!(%key, "read miss");
            return Err(UserStoreError::NotFound {
                email: email.to_string(),
            });
        }
        let raw = self
            .store
            .hash_read(&key)
            .map_err(|e| self.store_failed("hash_read", e))?;
        decode(&key, raw)
    }

    /// Overwrite the whole record. Fails with `NotFound` if absent; never
    /// creates a record.
    pub fn update(&self, name: &str, email: &str) -> Result<()> {
        let key = self.record_key(email);
        if !self.key_exists(&key)? {
            debug!(%key, "update rejected, record missing");
            return Err(UserStoreError::NotFound {
                email: email.to_string(),
            });
        }
        self.write(&key, name, email)?;
        info!(%key, "user updated");
        Ok(())
    }

    /// Overwrite the record from a [`User`].
    pub fn update_user(&self, user: &User) -> Result<()> {
        self.update(&user.name, &user.email)
    }

    /// Delete the record. Fails with `NotFound` if the store removed nothing.
    pub fn delete(&self, email: &str) -> Result<()> {
        let key = self.record_key(email);
        let removed = self
            .store
            .key_delete(&key)
            .map_err(|e| self.store_failed("key_delete", e))?;
        if removed == 0 {
            debug!(%key, "delete removed nothing");
            return Err(UserStoreError::NotFound {
                email: email.to_string(),
            });
        }
        info!(%key, "user deleted");
        Ok(())
    }

    /// Read every record.
    ///
    /// Scans all Record Keys, then reads each one. The whole collection is
    /// materialized before returning, which bounds this to small data sets.
    /// Order follows the store's key enumeration and is unspecified. A key
    /// deleted between the scan and its read is skipped.
    pub fn list_all(&self) -> Result<Vec<FieldMap>> {
        let keys = self
            .store
            .key_scan(&self.scan_pattern)
            .map_err(|e| self.store_failed("key_scan", e))?;

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let key = decode_key(key)?;
            let raw = self
                .store
                .hash_read(&key)
                .map_err(|e| self.store_failed("hash_read", e))?;
            if raw.is_empty() {
                debug!(%key, "record vanished after scan");
                continue;
            }
            records.push(decode(&key, raw)?);
        }
        debug!(count = records.len(), "listed users");
        Ok(records)
    }

    /// Number of Record Keys currently in the store.
    pub fn count(&self) -> Result<usize> {
        let keys = self
            .store
            .key_scan(&self.scan_pattern)
            .map_err(|e| self.store_failed("key_scan", e))?;
        Ok(keys.len())
    }

    /// One side-effect-free round trip to the store.
    pub fn ping(&self) -> Result<()> {
        self.key_exists(&self.config.key_prefix).map(|_| ())
    }

    fn key_exists(&self, key: &str) -> Result<bool> {
        self.store
            .key_exists(key)
            .map_err(|e| self.store_failed("key_exists", e))
    }

    fn write(&self, key: &str, name: &str, email: &str) -> Result<()> {
        let user = User::new(name, email);
        self.store
            .hash_write(key, &user.fields())
            .map_err(|e| self.store_failed("hash_write", e))
    }

    fn store_failed(&self, primitive: &'static str, e: S::Error) -> UserStoreError {
        warn!(primitive, error = %e, "store call failed");
        UserStoreError::store(e)
    }
}

/// Decode a scanned key, reporting it lossily if it is not UTF-8.
fn decode_key(key: RawKey) -> Result<String> {
    String::from_utf8(key).map_err(|e| UserStoreError::CorruptRecord {
        key: String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Decode a raw mapping into text, naming `key` if any byte run is not UTF-8.
fn decode(key: &str, raw: RawFields) -> Result<FieldMap> {
    raw.into_iter()
        .map(|(field, value)| {
            let field = String::from_utf8(field).ok()?;
            let value = String::from_utf8(value).ok()?;
            Some((field, value))
        })
        .collect::<Option<FieldMap>>()
        .ok_or_else(|| UserStoreError::CorruptRecord {
            key: key.to_string(),
        })
}
