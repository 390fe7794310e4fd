//! # user-store
//!
//! User records persisted as field-mappings in a hash-valued key-value store.
//!
//! The [`UserStore`] adapter turns create/read/update/delete/list intents into
//! five store primitives (see [`HashStore`]) and decodes what comes back. Each
//! record lives under the Record Key `"user:" + email`.
//!
//! ## Quick Start
//!
//! ```
//! use user_store::{MemoryStore, UserStore};
//!
//! let users = UserStore::new(MemoryStore::new());
//! users.create("Ada", "ada@example.com").unwrap();
//! assert_eq!(users.list_all().unwrap().len(), 1);
//! ```
//!
//! ## Backends
//!
//! | Backend | Feature flag | Use case |
//! |---------|-------------|----------|
//! | [`MemoryStore`] | *(always available)* | Testing, prototyping |
//! | `SqliteStore` | `sqlite` | Single-node deployments without a server |
//! | `RedbStore` | `redb` | Pure-Rust embedded storage |
//! | `RedisStore` | `redis` | Shared Redis server |

mod error;
mod memory;
pub mod pattern;
#[cfg(feature = "redb")]
mod redb;
#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;
mod types;
mod users;
pub mod validation;

pub use error::{BoxError, Result, UserStoreError};
pub use memory::{MemoryError, MemoryStore};
#[cfg(feature = "redb")]
pub use crate::redb::{RedbError, RedbStore};
#[cfg(feature = "redis")]
pub use crate::redis::{RedisConfig, RedisStore, RedisStoreError};
#[cfg(feature = "sqlite")]
pub use sqlite::{JournalMode, SqliteConfig, SqliteError, SqliteStore};
pub use traits::*;
pub use types::{FieldMap, User, EMAIL_FIELD, NAME_FIELD};
pub use users::{UserStore, UserStoreBuilder, UserStoreConfig, DEFAULT_KEY_PREFIX};
pub use validation::ValidationError;
