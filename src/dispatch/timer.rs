//! Per-minute dispatch loop.
//!
//! Once a minute the timer computes the current `(hour, minute, ISO
//! weekday)` and prefix-scans the store for slots due right now — the
//! slot keys are hour:minute-first precisely so this lookup is one
//! contiguous range. Matching events are handed to the notifier
//! fire-and-forget; the tick never blocks on delivery.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, Timelike};
use tracing::{debug, info, warn};

use crate::dispatch::notifier::{Firing, Notifier};
use crate::error::Result;
use crate::schedule::codec;
use crate::store::EventStore;

/// The per-minute dispatch timer.
pub struct DispatchTimer {
    store: Arc<dyn EventStore>,
    notifier: Arc<Notifier>,
    tick_secs: u64,
}

impl DispatchTimer {
    /// Create a timer with the standard one-minute tick.
    pub fn new(store: Arc<dyn EventStore>, notifier: Arc<Notifier>) -> Self {
        Self {
            store,
            notifier,
            tick_secs: 60,
        }
    }

    /// Override the tick interval (tests only need seconds, matching
    /// granularity stays one minute).
    pub fn with_tick_secs(mut self, tick_secs: u64) -> Self {
        self.tick_secs = tick_secs.max(1);
        self
    }

    /// Start the dispatch loop.
    ///
    /// Runs until the handle is dropped or aborted. A failed tick is
    /// logged and the loop carries on; transient store trouble never
    /// kills the timer.
    pub fn run(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("dispatch timer started, tick every {}s", self.tick_secs);
            let mut interval = tokio::time::interval(Duration::from_secs(self.tick_secs));

            loop {
                interval.tick().await;
                let now = Local::now();
                let weekday = now.weekday().number_from_monday() as u8; // monday = 1, sunday = 7
                match self.tick_at(now.hour(), now.minute(), weekday) {
                    Ok(0) => {}
                    Ok(count) => debug!("dispatched {count} events"),
                    Err(e) => warn!("dispatch tick failed: {e}"),
                }
            }
        })
    }

    /// Run one matching pass for the given wall-clock minute.
    ///
    /// Returns the number of firings handed to the notifier. Slots whose
    /// weekday is neither 0 (every day) nor today are skipped, as are
    /// malformed keys and pairs whose message record is missing.
    pub fn tick_at(&self, hour: u32, minute: u32, weekday: u8) -> Result<usize> {
        let prefix = codec::dispatch_prefix(hour, minute);
        let mut dispatched = 0;

        for (key_raw, entry_raw) in self.store.scan_prefix(&prefix)? {
            let Some(key) = codec::decode_key(&key_raw) else {
                debug!("skipping malformed slot key '{key_raw}'");
                continue;
            };
            if key.weekday != 0 && key.weekday != weekday {
                continue;
            }

            debug!("slot '{key_raw}' is due");
            for pair in codec::decode_entry(&entry_raw) {
                let message_key = codec::message_key(&pair.name, key.chat_id);
                let body = match self.store.get(&message_key) {
                    Ok(Some(body)) => body,
                    Ok(None) => {
                        // schedule entry without its message record; the
                        // two are written non-atomically, so fail open
                        warn!("slot '{key_raw}' references missing message '{message_key}'");
                        continue;
                    }
                    Err(e) => {
                        warn!("cannot fetch message '{message_key}': {e}");
                        continue;
                    }
                };

                self.notifier.dispatch(Firing {
                    chat_id: key.chat_id,
                    name: pair.name,
                    body,
                    noisy: pair.noisy,
                });
                dispatched += 1;
            }
        }

        Ok(dispatched)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::channels::traits::ChatTransport;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push((chat_id, text.to_owned()));
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        transport: Arc<RecordingTransport>,
        notifier: Arc<Notifier>,
        timer: DispatchTimer,
    }

    fn make_timer() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Arc::new(Notifier::new(transport.clone()));
        let timer = DispatchTimer::new(store.clone(), notifier.clone());
        Fixture {
            store,
            transport,
            notifier,
            timer,
        }
    }

    async fn settle(notifier: &Notifier) {
        while notifier.in_flight() > 0 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn tick_matches_every_day_and_today_but_not_other_weekdays() {
        let f = make_timer();
        // wednesday tick at 9:05
        f.store.put("9:5/0/42", "gallines/0").unwrap();
        f.store.put("9:5/3/42", "vidre/0").unwrap();
        f.store.put("9:5/1/42", "paper/0").unwrap();
        f.store.put("gallines/42", "close the henhouse").unwrap();
        f.store.put("vidre/42", "glass day").unwrap();
        f.store.put("paper/42", "paper day").unwrap();

        let dispatched = f.timer.tick_at(9, 5, 3).unwrap();
        assert_eq!(dispatched, 2);

        settle(&f.notifier).await;
        let mut sent: Vec<String> = f
            .transport
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect();
        sent.sort();
        assert_eq!(sent, vec!["close the henhouse", "glass day"]);
    }

    #[tokio::test]
    async fn tick_does_not_match_a_longer_minute_with_the_same_digits() {
        let f = make_timer();
        f.store.put("9:55/0/42", "gallines/0").unwrap();
        f.store.put("gallines/42", "msg").unwrap();

        assert_eq!(f.timer.tick_at(9, 5, 3).unwrap(), 0);
        assert_eq!(f.timer.tick_at(9, 55, 3).unwrap(), 1);
        settle(&f.notifier).await;
    }

    #[tokio::test]
    async fn missing_message_record_is_skipped_not_fatal() {
        let f = make_timer();
        f.store.put("9:5/0/42", "gallines/0,vidre/0").unwrap();
        f.store.put("vidre/42", "glass day").unwrap();

        let dispatched = f.timer.tick_at(9, 5, 1).unwrap();
        assert_eq!(dispatched, 1);

        settle(&f.notifier).await;
        let sent = f.transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "glass day");
    }

    #[tokio::test]
    async fn malformed_slot_keys_are_skipped() {
        let f = make_timer();
        // weekday out of range and a non-numeric chat id
        f.store.put("9:5/9/42", "gallines/0").unwrap();
        f.store.put("9:5/0/notachat", "gallines/0").unwrap();

        assert_eq!(f.timer.tick_at(9, 5, 1).unwrap(), 0);
    }

    #[tokio::test]
    async fn every_pair_in_a_slot_is_dispatched() {
        let f = make_timer();
        f.store.put("20:45/0/42", "gallines/0,vidre/0").unwrap();
        f.store.put("gallines/42", "a").unwrap();
        f.store.put("vidre/42", "b").unwrap();

        assert_eq!(f.timer.tick_at(20, 45, 6).unwrap(), 2);
        settle(&f.notifier).await;
        assert_eq!(f.transport.sent.lock().unwrap().len(), 2);
    }
}
