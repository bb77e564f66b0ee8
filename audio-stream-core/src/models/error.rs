use thiserror::Error;

/// Errors surfaced by the streaming engine and its capability backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("invalid stream handle")]
    InvalidHandle,

    #[error("stream is not initialized")]
    NotInitialized,

    #[error("missing capability: {0}")]
    MissingCapability(&'static str),

    #[error("invalid wav format: {0}")]
    InvalidFormat(String),

    #[error("stream is already active")]
    AlreadyActive,

    #[error("stream is not active")]
    NotActive,

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("transport error: {0}")]
    TransportError(String),
}
