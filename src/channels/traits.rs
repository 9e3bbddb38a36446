use async_trait::async_trait;

/// Outbound delivery contract. New transports only need to implement
/// this trait.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver one text message to a chat.
    ///
    /// The engine calls this once per delivery and treats an error as
    /// logged-and-continue — retries, if wanted, belong to the
    /// transport.
    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()>;
}
