//! Dispatch engine: the per-minute timer and the per-firing repeat
//! controllers.
//!
//! The timer finds slots due in the current minute and hands each event
//! to the notifier fire-and-forget; the notifier runs every firing as an
//! independent task that keeps redelivering "noisy" reminders until the
//! shared active set says stop.

pub mod notifier;
pub mod timer;

pub use notifier::{ActiveFirings, Firing, Notifier};
pub use timer::DispatchTimer;
