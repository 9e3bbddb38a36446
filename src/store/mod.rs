//! Persistent event store abstraction.
//!
//! The scheduler needs very little from its backing store: atomic
//! single-key put/get/delete plus lexicographically ordered prefix
//! iteration (due-slot lookup is a prefix scan over `"{H}:{M}/"` keys).
//! Two backends implement the contract: [`SledStore`] for production and
//! [`MemoryStore`] for tests and ephemeral runs.

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use crate::error::Result;

/// Ordered key-value store contract used by the registry and dispatcher.
///
/// Keys and values are UTF-8 text; ordering is plain byte order over the
/// encoded keys. Scans return materialized snapshots, so callers can
/// mutate the store while walking the results.
pub trait EventStore: Send + Sync {
    /// Insert or overwrite a key.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Fetch a value, `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Delete a key. Deleting an absent key is a no-op.
    fn delete(&self, key: &str) -> Result<()>;

    /// All entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>>;

    /// Every entry in the store, in key order.
    fn scan_all(&self) -> Result<Vec<(String, String)>>;
}
