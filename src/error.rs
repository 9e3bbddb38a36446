//! Error types for the reminder engine.

/// Top-level error type for the reminder scheduler.
#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    /// User input failed validation. The message is shown to the user
    /// verbatim as the command reply.
    #[error("{0}")]
    Validation(String),

    /// Key-value store failure (open, read, write, or scan).
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ReminderError>;
