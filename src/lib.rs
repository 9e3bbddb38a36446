//! Cuckoo: per-chat recurring reminder scheduler.
//!
//! Users register events bound to a time-of-day, an optional weekday,
//! and a free-text message; once a minute the engine finds events due
//! now and delivers each message, optionally redelivering every N
//! minutes ("noisy" mode) until stopped.
//!
//! # Architecture
//!
//! The engine is built from small independent pieces:
//! - **Store**: ordered key-value backing (sled) with prefix scans
//! - **Codec**: the `"{H}:{M}/{weekday}/{chat}"` key layout and pair lists
//! - **Registry**: add / re-noise / list / remove merge semantics
//! - **Dispatch timer**: the once-a-minute due-slot scan
//! - **Notifier**: per-firing repeat controllers with cooperative stop
//! - **Channels**: the outbound transport seam and the command router
//!
//! Delivery is best-effort by design: a crash between "matched" and
//! "sent" loses that firing, and in-flight repeat loops do not survive a
//! restart.

pub mod channels;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod schedule;
pub mod store;

pub use channels::{ChatTransport, CommandRouter, ConsoleTransport};
pub use config::ReminderConfig;
pub use dispatch::{ActiveFirings, DispatchTimer, Firing, Notifier};
pub use error::{ReminderError, Result};
pub use schedule::{EventEntry, EventRegistry, ScheduleKey};
pub use store::{EventStore, MemoryStore, SledStore};
