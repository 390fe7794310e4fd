//! Redis backend using the synchronous [`redis`](https://docs.rs/redis) client.
//!
//! Records live in native Redis hashes, so the data stays readable with
//! `redis-cli HGETALL user:<email>`.
//!
//! Enable with `features = ["redis"]`.
//!
//! ```no_run
//! use user_store::{HashStore, RedisStore};
//!
//! let store = RedisStore::open("redis://127.0.0.1:6379/").unwrap();
//! store.hash_write("user:a@x.com", &[("name", "A")]).unwrap();
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use redis::{Commands, Connection};

use crate::traits::{HashStore, RawFields, RawKey};

/// Redis connection options.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL, e.g. `redis://redis:6379/0`.
    pub url: String,
    /// Time allowed for the initial TCP connect. Defaults to 5s.
    pub connect_timeout: Duration,
    /// Read/write timeout for every command. `None` blocks indefinitely.
    pub response_timeout: Option<Duration>,
    /// `COUNT` hint passed to each `SCAN` call. Defaults to 100.
    pub scan_count: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/".to_string(),
            connect_timeout: Duration::from_secs(5),
            response_timeout: Some(Duration::from_secs(5)),
            scan_count: 100,
        }
    }
}

/// Error type for the Redis backend.
#[derive(Debug, thiserror::Error)]
pub enum RedisStoreError {
    /// An error from the redis client: connection refused, timeout, or a
    /// server-side error reply.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    /// Lock poisoned.
    #[error("redis connection lock poisoned")]
    LockPoisoned,
}

/// Redis persistence backend.
///
/// Holds one connection behind a `Mutex`; concurrent callers take turns on
/// it. No retries: a failed command surfaces immediately.
pub struct RedisStore {
    conn: Mutex<Connection>,
    scan_count: usize,
}

impl RedisStore {
    /// Connect to `url` with default timeouts.
    pub fn open(url: &str) -> Result<Self, RedisStoreError> {
        Self::open_with_config(RedisConfig {
            url: url.to_string(),
            ..RedisConfig::default()
        })
    }

    /// Connect with custom configuration.
    pub fn open_with_config(config: RedisConfig) -> Result<Self, RedisStoreError> {
        let client = redis::Client::open(config.url.as_str())?;
        let conn = client.get_connection_with_timeout(config.connect_timeout)?;
        conn.set_read_timeout(config.response_timeout)?;
        conn.set_write_timeout(config.response_timeout)?;
        Ok(Self {
            conn: Mutex::new(conn),
            scan_count: config.scan_count.max(1),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, RedisStoreError> {
        self.conn.lock().map_err(|_| RedisStoreError::LockPoisoned)
    }
}

impl HashStore for RedisStore {
    type Error = RedisStoreError;

    fn key_exists(&self, key: &str) -> Result<bool, Self::Error> {
        let mut conn = self.lock()?;
        let exists: bool = conn.exists(key)?;
        Ok(exists)
    }

    fn hash_write(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), Self::Error> {
        let mut conn = self.lock()?;
        // HSET alone merges into an existing hash; DEL first inside MULTI
        // so the mapping is replaced as a unit.
        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if !fields.is_empty() {
            pipe.hset_multiple(key, fields).ignore();
        }
        pipe.query::<()>(&mut *conn)?;
        Ok(())
    }

    fn hash_read(&self, key: &str) -> Result<RawFields, Self::Error> {
        let mut conn = self.lock()?;
        let fields: HashMap<Vec<u8>, Vec<u8>> = conn.hgetall(key)?;
        Ok(fields.into_iter().collect())
    }

    fn key_delete(&self, key: &str) -> Result<u64, Self::Error> {
        let mut conn = self.lock()?;
        let removed: u64 = conn.del(key)?;
        Ok(removed)
    }

    fn key_scan(&self, pattern: &str) -> Result<Vec<RawKey>, Self::Error> {
        let mut conn = self.lock()?;
        // SCAN may report a key more than once across iterations.
        let mut keys = HashSet::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<RawKey>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.scan_count)
                .query(&mut *conn)?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys.into_iter().collect())
    }
}
