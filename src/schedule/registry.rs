//! Event registry: merge/update business logic over the schedule codec.
//!
//! All mutations are read-modify-write sequences against the store
//! (fetch entry, merge pairs, write back). The store only guarantees
//! atomic single-key operations, so every mutation runs under a per-chat
//! lock — two concurrent writers for the same chat can no longer lose
//! each other's update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::{ReminderError, Result};
use crate::schedule::codec;
use crate::schedule::{EventEntry, weekday_label};
use crate::store::EventStore;

/// Largest accepted noisy period, in minutes (one day).
pub const MAX_NOISY_MINUTES: u32 = 1440;

/// Registry of scheduled events for all chats.
pub struct EventRegistry {
    store: Arc<dyn EventStore>,
    chat_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl EventRegistry {
    /// Create a registry over the given store.
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            chat_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Serialization point for one chat's read-modify-write sequences.
    fn chat_lock(&self, chat_id: i64) -> Arc<Mutex<()>> {
        let mut locks = match self.chat_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.entry(chat_id).or_default().clone()
    }

    /// Register (or re-register) an event for a chat.
    ///
    /// `weekday` is the textual weekday code (`"0"` = every day, `"1"`..
    /// `"7"` = Monday..Sunday) and `hour_minute` a 24-hour `HH:MM` time.
    /// The event name is sanitized by stripping the store's field
    /// separator. Re-adding an existing name replaces its pair in place:
    /// the updated pair is written first, every other pair is carried
    /// over unchanged, and the prior noisy period is preserved (use
    /// [`EventRegistry::set_noisy`] to change it).
    ///
    /// The merged slot entry and the message record are two separate
    /// store writes; a crash between them leaves an entry referencing a
    /// missing message, which the dispatcher skips with a warning.
    pub fn add_event(
        &self,
        chat_id: i64,
        name: &str,
        weekday: &str,
        hour_minute: &str,
        body: &str,
    ) -> Result<()> {
        let weekday: u8 = weekday
            .parse()
            .map_err(|_| ReminderError::Validation("Week day is not a number".to_owned()))?;
        if weekday > 7 {
            return Err(ReminderError::Validation(
                "Week day is not between 0 and 7".to_owned(),
            ));
        }
        let (hour, minute) = codec::parse_hour_minute(hour_minute)?;

        let name = name.trim().replace(codec::FIELD_SEPARATOR, "");
        if name.is_empty() {
            return Err(ReminderError::Validation("Event name is empty".to_owned()));
        }

        let key = codec::encode_key(&crate::schedule::ScheduleKey {
            hour,
            minute,
            weekday,
            chat_id,
        });

        let lock = self.chat_lock(chat_id);
        let _guard = lock_or_recover(&lock);

        // Merge with whatever already fires at this slot. A pair with the
        // same name is replaced, not duplicated, keeping its noisy period.
        let mut noisy = 0;
        let mut merged = Vec::new();
        if let Some(raw) = self.store.get(&key)? {
            for pair in codec::decode_entry(&raw) {
                if pair.name == name {
                    noisy = pair.noisy;
                } else {
                    merged.push(pair);
                }
            }
        }
        merged.insert(
            0,
            EventEntry {
                name: name.clone(),
                noisy,
            },
        );

        self.store.put(&key, &codec::encode_entry(&merged))?;
        self.store
            .put(&codec::message_key(&name, chat_id), body)?;

        info!(
            "registered event '{name}' at {hour}:{minute} ({}) for chat {chat_id}",
            weekday_label(weekday)
        );
        Ok(())
    }

    /// Change an event's noisy period everywhere it is scheduled.
    ///
    /// Rewrites the matching pair in every slot entry of the chat that
    /// contains `name`, preserving pair order. A name that matches no
    /// entry is a silent no-op, not an error.
    pub fn set_noisy(&self, chat_id: i64, name: &str, period: u32) -> Result<()> {
        if period > MAX_NOISY_MINUTES {
            return Err(ReminderError::Validation("Noisy period too big".to_owned()));
        }

        let lock = self.chat_lock(chat_id);
        let _guard = lock_or_recover(&lock);

        let mut found = false;
        for key in self.chat_slot_keys(chat_id)? {
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            let mut entries = codec::decode_entry(&raw);
            let mut changed = false;
            for entry in &mut entries {
                if entry.name == name {
                    entry.noisy = period;
                    changed = true;
                }
            }
            if changed {
                self.store.put(&key, &codec::encode_entry(&entries))?;
                found = true;
            }
        }

        if found {
            info!("noisy period of '{name}' set to {period} for chat {chat_id}");
        } else {
            debug!("noisy update for unknown event '{name}' in chat {chat_id}, nothing to do");
        }
        Ok(())
    }

    /// List a chat's scheduled events.
    ///
    /// With `human_readable` each event becomes a
    /// `"[name] Hour H:M, <weekday>, Noisy N"` line; otherwise the raw
    /// slot keys are returned. A chat with no events yields an empty
    /// vector. Every call re-scans the store.
    pub fn list_events(&self, chat_id: i64, human_readable: bool) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for (key_raw, value) in self.store.scan_all()? {
            let Some(key) = codec::decode_key(&key_raw) else {
                continue; // message record or foreign key shape
            };
            if key.chat_id != chat_id {
                continue;
            }
            if !human_readable {
                lines.push(key_raw);
                continue;
            }
            for pair in codec::decode_entry(&value) {
                lines.push(format!(
                    "[{}] Hour {}:{}, {}, Noisy {}",
                    pair.name,
                    key.hour,
                    key.minute,
                    weekday_label(key.weekday),
                    pair.noisy
                ));
            }
        }
        Ok(lines)
    }

    /// Remove an event by name: its pair is deleted from every slot entry
    /// of the chat, entries that become empty are dropped entirely, and
    /// the message record is deleted.
    pub fn remove_event(&self, chat_id: i64, name: &str) -> Result<()> {
        let lock = self.chat_lock(chat_id);
        let _guard = lock_or_recover(&lock);

        for key in self.chat_slot_keys(chat_id)? {
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            let entries = codec::decode_entry(&raw);
            let kept: Vec<EventEntry> =
                entries.iter().filter(|e| e.name != name).cloned().collect();
            if kept.len() == entries.len() {
                continue;
            }
            if kept.is_empty() {
                self.store.delete(&key)?;
            } else {
                self.store.put(&key, &codec::encode_entry(&kept))?;
            }
        }

        self.store.delete(&codec::message_key(name, chat_id))?;
        info!("removed event '{name}' for chat {chat_id}");
        Ok(())
    }

    /// Raw slot keys belonging to one chat, via full-store scan.
    ///
    /// O(total keys), which is fine at this system's scale.
    fn chat_slot_keys(&self, chat_id: i64) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for (key_raw, _) in self.store.scan_all()? {
            if let Some(key) = codec::decode_key(&key_raw)
                && key.chat_id == chat_id
            {
                keys.push(key_raw);
            }
        }
        Ok(keys)
    }
}

fn lock_or_recover(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
