//! Error types for the ferry wire protocol.

/// Errors produced while framing or streaming a transfer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The compressed payload could not be decoded.
    #[error("corrupt payload stream: {0}")]
    Decode(#[source] std::io::Error),

    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}
