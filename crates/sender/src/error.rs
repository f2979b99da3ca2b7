//! Error types for the sender.

use ferry_protocol::ProtocolError;

/// Errors produced while sending a single file.
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("invalid source path: {0}")]
    InvalidPath(String),

    #[error("connection timed out")]
    ConnectTimeout,

    #[error("timed out waiting for the checksum reply")]
    ReplyTimeout,

    /// The receiver closed the connection without replying, e.g. because
    /// admission control rejected it.
    #[error("receiver closed the connection without a checksum reply")]
    ClosedWithoutReply,

    #[error("payload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
