use std::sync::Arc;

/// A field-mapping in the store's native byte representation.
///
/// Order is whatever the backend returns; callers must not rely on it.
pub type RawFields = Vec<(Vec<u8>, Vec<u8>)>;

/// A key as the store returns it from a scan.
///
/// Other clients of a shared store may write keys that are not UTF-8, so
/// scans hand back bytes and the caller decides how to treat them.
pub type RawKey = Vec<u8>;

/// The five key-value primitives the record adapter is built on.
///
/// Every backend implements this trait. Keys are text; each key holds one
/// field-mapping (a Redis hash). Methods take `&self`: backends synchronize
/// internally so one store can be shared by concurrent request handlers.
///
/// Each call is a single round trip to the store. Nothing here composes
/// two primitives atomically.
pub trait HashStore {
    /// Error type for this backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Check whether `key` holds a field-mapping.
    fn key_exists(&self, key: &str) -> Result<bool, Self::Error>;

    /// Replace the whole field-mapping under `key`.
    ///
    /// Fields present before the call and absent from `fields` are gone
    /// afterwards. Writing an empty mapping leaves the key absent.
    fn hash_write(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), Self::Error>;

    /// Read every field under `key`. Returns an empty mapping when the key
    /// does not exist.
    fn hash_read(&self, key: &str) -> Result<RawFields, Self::Error>;

    /// Remove `key`. Returns the number of keys removed (0 or 1).
    fn key_delete(&self, key: &str) -> Result<u64, Self::Error>;

    /// List every key matching a glob `pattern` (see [`crate::pattern`]).
    fn key_scan(&self, pattern: &str) -> Result<Vec<RawKey>, Self::Error>;
}

impl<S: HashStore + ?Sized> HashStore for Arc<S> {
    type Error = S::Error;

    fn key_exists(&self, key: &str) -> Result<bool, Self::Error> {
        (**self).key_exists(key)
    }

    fn hash_write(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), Self::Error> {
        (**self).hash_write(key, fields)
    }

    fn hash_read(&self, key: &str) -> Result<RawFields, Self::Error> {
        (**self).hash_read(key)
    }

    fn key_delete(&self, key: &str) -> Result<u64, Self::Error> {
        (**self).key_delete(key)
    }

    fn key_scan(&self, pattern: &str) -> Result<Vec<RawKey>, Self::Error> {
        (**self).key_scan(pattern)
    }
}
