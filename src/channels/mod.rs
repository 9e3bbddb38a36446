//! Chat-facing seams: the outbound transport contract and the inbound
//! command router.
//!
//! The engine is transport-agnostic — anything that can deliver a text
//! message to a chat id implements [`traits::ChatTransport`]. Command
//! parsing upstream of the router (Telegram updates, a web hook, stdin)
//! is equally external; the router only maps one already-extracted
//! command line to registry/notifier operations and a reply string.

pub mod commands;
pub mod console;
pub mod traits;

pub use commands::CommandRouter;
pub use console::ConsoleTransport;
pub use traits::ChatTransport;
