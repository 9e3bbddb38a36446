//! In-memory event store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::Result;
use crate::store::EventStore;

/// Ordered in-memory store over a `BTreeMap`.
///
/// Shares the sled backend's ordering semantics, so tests exercise the
/// exact scan behavior the dispatcher relies on.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl EventStore for MemoryStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let map = self.lock();
        Ok(map
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn scan_all(&self) -> Result<Vec<(String, String)>> {
        let map = self.lock();
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}
