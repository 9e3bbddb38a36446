//! Stdout transport for headless runs.

use async_trait::async_trait;

use crate::channels::traits::ChatTransport;

/// Transport that prints deliveries to stdout, one line per message.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        println!("[chat {chat_id}] {text}");
        Ok(())
    }
}
