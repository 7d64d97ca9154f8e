use thiserror::Error;

/// Errors that can occur when talking to the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus is shut down or unreachable.
    #[error("Message bus is closed")]
    Closed,

    /// The transport rejected the message.
    #[error("Message bus transport error: {0}")]
    Transport(String),
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
