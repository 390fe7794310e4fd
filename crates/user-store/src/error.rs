//! Error taxonomy for record operations.

use thiserror::Error;

/// Boxed backend error carried by [`UserStoreError::StoreUnavailable`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors returned by [`UserStore`](crate::UserStore).
///
/// None of these are retried inside the adapter; recovery belongs to the
/// caller.
#[derive(Debug, Error)]
pub enum UserStoreError {
    /// Create was called for an email whose record already exists.
    #[error("user already exists: {email}")]
    AlreadyExists {
        /// Email of the existing record.
        email: String,
    },

    /// Read, update or delete was called for an email with no record.
    #[error("user not found: {email}")]
    NotFound {
        /// Email that was looked up.
        email: String,
    },

    /// The backing store could not be reached or failed internally.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] BoxError),

    /// A stored field name or value is not valid UTF-8.
    #[error("stored record {key} is not valid UTF-8")]
    CorruptRecord {
        /// Record Key holding the bad bytes.
        key: String,
    },
}

/// Result type for record operations.
pub type Result<T> = std::result::Result<T, UserStoreError>;

impl UserStoreError {
    pub(crate) fn store<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StoreUnavailable(Box::new(e))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a duplicate-create error.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Check if the store itself failed.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
