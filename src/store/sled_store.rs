//! Sled-backed event store.

use std::path::Path;

use crate::error::{ReminderError, Result};
use crate::store::EventStore;

/// Persistent store backed by a sled database directory.
///
/// Every write is flushed before returning so a reminder added just
/// before a crash survives the restart.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path).map_err(|e| ReminderError::Store(e.to_string()))?;
        Ok(Self { db })
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|e| ReminderError::Store(e.to_string()))
    }
}

impl EventStore for SledStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| ReminderError::Store(e.to_string()))?;
        self.flush()
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| ReminderError::Store(e.to_string()))?;
        Ok(value.map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| ReminderError::Store(e.to_string()))?;
        self.flush()
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for pair in self.db.scan_prefix(prefix.as_bytes()) {
            let (k, v) = pair.map_err(|e| ReminderError::Store(e.to_string()))?;
            entries.push((
                String::from_utf8_lossy(&k).into_owned(),
                String::from_utf8_lossy(&v).into_owned(),
            ));
        }
        Ok(entries)
    }

    fn scan_all(&self) -> Result<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for pair in self.db.iter() {
            let (k, v) = pair.map_err(|e| ReminderError::Store(e.to_string()))?;
            entries.push((
                String::from_utf8_lossy(&k).into_owned(),
                String::from_utf8_lossy(&v).into_owned(),
            ));
        }
        Ok(entries)
    }
}
