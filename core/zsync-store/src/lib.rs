//! Shared string-keyed stores for zsync.
//!
//! Every execution context sees the same store. Stores are synchronous and
//! offer no compare-and-swap: a write is last-writer-wins across contexts.
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process map; clones share one keyspace, so several
//!   contexts in one process can be modeled with one store. Supports an
//!   optional byte quota, mirroring browser storage limits.
//! - [`SqliteStore`]: file-backed map shared by every process that opens the
//!   same database file.

mod error;
mod memory;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A shared, synchronous, string-to-string mapping.
///
/// Implementations must be safe to use from several contexts at once; they
/// are not required to order concurrent writers.
pub trait SharedStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// Returns every key currently in the store.
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Whether `key` is present.
    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get_item(key)?.is_some())
    }
}
