//! Inbound command router.
//!
//! Maps one command line (`/add`, `/list`, `/noisy`, `/stop`, `/del`) to
//! the matching registry or notifier operation and produces the
//! user-facing reply. Validation failures come back verbatim as the
//! reply and never reach the store; store failures are logged and the
//! user just sees `"internal error"`.

use std::sync::Arc;

use tracing::error;

use crate::dispatch::notifier::Notifier;
use crate::error::{ReminderError, Result};
use crate::schedule::EventRegistry;

/// Routes chat commands to the engine.
pub struct CommandRouter {
    registry: Arc<EventRegistry>,
    notifier: Arc<Notifier>,
}

impl CommandRouter {
    /// Create a router over the given registry and notifier.
    pub fn new(registry: Arc<EventRegistry>, notifier: Arc<Notifier>) -> Self {
        Self { registry, notifier }
    }

    /// Handle one command line from a chat and return the reply text.
    ///
    /// Expected shapes:
    ///
    /// ```text
    /// /add gallines 0 20:45 Cal tancar les gallines
    /// /list
    /// /noisy gallines 10
    /// /stop gallines
    /// /del gallines
    /// ```
    pub fn handle(&self, chat_id: i64, line: &str) -> String {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return "I don't understand".to_owned();
        };
        let mut parts = rest.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match command {
            "add" => {
                if args.len() < 4 {
                    return "Not enough arguments for /add".to_owned();
                }
                let body = args[3..].join(" ");
                reply_for(
                    self.registry
                        .add_event(chat_id, args[0], args[1], args[2], &body),
                )
            }
            "list" => match self.registry.list_events(chat_id, true) {
                Ok(lines) if lines.is_empty() => "No events registered".to_owned(),
                Ok(lines) => lines.join("\n"),
                Err(e) => internal_error(&e),
            },
            "noisy" => {
                if args.len() < 2 {
                    return "Not enough arguments for /noisy".to_owned();
                }
                let Ok(period) = args[1].parse::<u32>() else {
                    return "Noisy period is not a number".to_owned();
                };
                reply_for(self.registry.set_noisy(chat_id, args[0], period))
            }
            "stop" => {
                if args.is_empty() {
                    return "Not enough arguments for /stop".to_owned();
                }
                self.notifier.stop(args[0], chat_id);
                "ok!".to_owned()
            }
            "del" => {
                if args.is_empty() {
                    return "Not enough arguments for /del".to_owned();
                }
                reply_for(self.registry.remove_event(chat_id, args[0]))
            }
            _ => "I don't understand".to_owned(),
        }
    }
}

fn reply_for(result: Result<()>) -> String {
    match result {
        Ok(()) => "ok!".to_owned(),
        Err(ReminderError::Validation(message)) => message,
        Err(e) => internal_error(&e),
    }
}

fn internal_error(e: &ReminderError) -> String {
    error!("command failed: {e}");
    "internal error".to_owned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::channels::traits::ChatTransport;
    use crate::store::{EventStore, MemoryStore};
    use async_trait::async_trait;

    struct SilentTransport;

    #[async_trait]
    impl ChatTransport for SilentTransport {
        async fn send_message(&self, _chat_id: i64, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn make_router() -> (CommandRouter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(EventRegistry::new(store.clone()));
        let notifier = Arc::new(Notifier::new(Arc::new(SilentTransport)));
        (CommandRouter::new(registry, notifier), store)
    }

    #[test]
    fn add_and_list_round_trip() {
        let (router, _store) = make_router();
        assert_eq!(
            router.handle(42, "/add gallines 0 20:45 Cal tancar les gallines"),
            "ok!"
        );
        assert_eq!(
            router.handle(42, "/list"),
            "[gallines] Hour 20:45, all days, Noisy 0"
        );
    }

    #[test]
    fn list_of_empty_chat_has_a_friendly_reply() {
        let (router, _store) = make_router();
        assert_eq!(router.handle(42, "/list"), "No events registered");
    }

    #[test]
    fn validation_errors_are_the_reply() {
        let (router, _store) = make_router();
        assert_eq!(
            router.handle(42, "/add gallines nine 20:45 some message"),
            "Week day is not a number"
        );
        assert_eq!(
            router.handle(42, "/noisy gallines soon"),
            "Noisy period is not a number"
        );
    }

    #[test]
    fn arity_errors_name_the_command() {
        let (router, _store) = make_router();
        assert_eq!(router.handle(42, "/add gallines 0"), "Not enough arguments for /add");
        assert_eq!(router.handle(42, "/noisy gallines"), "Not enough arguments for /noisy");
        assert_eq!(router.handle(42, "/stop"), "Not enough arguments for /stop");
        assert_eq!(router.handle(42, "/del"), "Not enough arguments for /del");
    }

    #[test]
    fn unknown_input_is_not_understood() {
        let (router, _store) = make_router();
        assert_eq!(router.handle(42, "/frobnicate"), "I don't understand");
        assert_eq!(router.handle(42, "hello there"), "I don't understand");
    }

    #[test]
    fn noisy_updates_the_stored_pair() {
        let (router, store) = make_router();
        router.handle(42, "/add gallines 0 20:45 msg");
        router.handle(42, "/add vidre 0 20:45 msg2");
        assert_eq!(router.handle(42, "/noisy gallines 10"), "ok!");
        assert_eq!(
            store.get("20:45/0/42").unwrap().as_deref(),
            Some("vidre/0,gallines/10")
        );
    }

    #[test]
    fn del_removes_schedule_pair_and_message() {
        let (router, store) = make_router();
        router.handle(42, "/add gallines 0 20:45 msg");
        assert_eq!(router.handle(42, "/del gallines"), "ok!");
        assert_eq!(store.get("20:45/0/42").unwrap(), None);
        assert_eq!(store.get("gallines/42").unwrap(), None);
        assert_eq!(router.handle(42, "/list"), "No events registered");
    }

    #[test]
    fn stop_is_idempotent_and_always_ok() {
        let (router, _store) = make_router();
        assert_eq!(router.handle(42, "/stop gallines"), "ok!");
        assert_eq!(router.handle(42, "/stop gallines"), "ok!");
    }
}
