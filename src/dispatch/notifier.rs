//! Message delivery and the noisy-repeat state machine.
//!
//! Each firing runs as its own tokio task:
//!
//! ```text
//! Start → Sent → (noisy == 0: Done)
//!          └→ WaitingRepeat → { Sent (loop) | Cancelled }
//! ```
//!
//! Cancellation is cooperative. `stop` only removes the firing's marker
//! from the shared [`ActiveFirings`] set; the running loop notices at its
//! next wake point, so one extra delivery can race a stop.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use crate::channels::traits::ChatTransport;

/// Shared set of currently-running repeat loops, keyed by
/// `(event name, chat)`.
///
/// Mutex-guarded so concurrent controllers and `stop` calls cannot
/// corrupt each other's view.
#[derive(Clone, Default)]
pub struct ActiveFirings {
    inner: Arc<Mutex<HashSet<(String, i64)>>>,
}

impl ActiveFirings {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<(String, i64)>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn insert(&self, name: &str, chat_id: i64) {
        self.lock().insert((name.to_owned(), chat_id));
    }

    /// Remove a marker. Idempotent; removing an absent marker is a no-op.
    pub fn remove(&self, name: &str, chat_id: i64) {
        self.lock().remove(&(name.to_owned(), chat_id));
    }

    /// Whether a repeat loop for `(name, chat)` is still wanted.
    pub fn contains(&self, name: &str, chat_id: i64) -> bool {
        self.lock().contains(&(name.to_owned(), chat_id))
    }

    /// Number of registered markers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no repeat loop is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// One event due for delivery.
#[derive(Debug, Clone)]
pub struct Firing {
    pub chat_id: i64,
    pub name: String,
    pub body: String,
    /// Repeat interval in minutes; 0 = deliver once.
    pub noisy: u32,
}

/// Delivers firings through the chat transport and owns their repeat
/// loops.
pub struct Notifier {
    transport: Arc<dyn ChatTransport>,
    active: ActiveFirings,
    in_flight: Arc<AtomicUsize>,
}

impl Notifier {
    /// Create a notifier sending through `transport`.
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            active: ActiveFirings::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to the shared active set (for `stop` commands).
    pub fn active(&self) -> ActiveFirings {
        self.active.clone()
    }

    /// Number of firing tasks currently running. Lets tests assert
    /// termination instead of guessing at timing.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Cancel a firing's repeat loop. Idempotent; does not touch
    /// persisted schedule data.
    pub fn stop(&self, name: &str, chat_id: i64) {
        debug!("stop requested for '{name}' in chat {chat_id}");
        self.active.remove(name, chat_id);
    }

    /// Start an independent delivery task for one firing.
    ///
    /// Fire-and-forget from the dispatcher's point of view; the returned
    /// handle is only needed by tests.
    pub fn dispatch(&self, firing: Firing) -> tokio::task::JoinHandle<()> {
        let transport = self.transport.clone();
        let active = self.active.clone();
        let in_flight = self.in_flight.clone();

        in_flight.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            run_firing(transport, active, firing).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

/// The repeat state machine for a single firing.
async fn run_firing(transport: Arc<dyn ChatTransport>, active: ActiveFirings, firing: Firing) {
    active.insert(&firing.name, firing.chat_id);

    loop {
        debug!(
            "sending '{}' to chat {}: {}",
            firing.name, firing.chat_id, firing.body
        );
        if let Err(e) = transport.send_message(firing.chat_id, &firing.body).await {
            // never retried here; redelivery only happens via noisy mode
            warn!(
                "delivery of '{}' to chat {} failed: {e}",
                firing.name, firing.chat_id
            );
        }

        if firing.noisy == 0 {
            break;
        }

        tokio::time::sleep(Duration::from_secs(u64::from(firing.noisy) * 60)).await;
        if !active.contains(&firing.name, firing.chat_id) {
            debug!("firing '{}' cancelled for chat {}", firing.name, firing.chat_id);
            break;
        }
    }

    active.remove(&firing.name, firing.chat_id);
    debug!("end of firing '{}' for chat {}", firing.name, firing.chat_id);
}
