//! Schedule domain model: firing slots, event entries, and their store
//! encoding.
//!
//! A firing slot is identified by `(hour, minute, weekday, chat)` and maps
//! to the list of events that go off at that moment. The registry layers
//! merge/update semantics on top of the codec.

pub mod codec;
pub mod registry;

pub use registry::EventRegistry;

/// Human-readable weekday labels, indexed by weekday code.
pub const WEEKDAY_LABELS: [&str; 8] = [
    "all days",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Identifies one firing slot: a wall-clock minute, a weekday filter, and
/// the chat the events belong to.
///
/// `weekday == 0` means every day; `1..=7` map Monday..Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleKey {
    pub hour: u32,
    pub minute: u32,
    pub weekday: u8,
    pub chat_id: i64,
}

/// One `(event name, noisy period)` pair inside a slot's entry.
///
/// `noisy == 0` means deliver once; otherwise redeliver every `noisy`
/// minutes until stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    pub name: String,
    pub noisy: u32,
}

/// Label for a weekday code, `"all days"` for 0.
///
/// Out-of-range codes fall back to `"all days"`; callers are expected to
/// have range-checked already.
pub fn weekday_label(weekday: u8) -> &'static str {
    WEEKDAY_LABELS
        .get(usize::from(weekday))
        .copied()
        .unwrap_or(WEEKDAY_LABELS[0])
}
