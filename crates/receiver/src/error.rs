//! Error types for the receiver.

use ferry_admission::AdmissionError;
use ferry_protocol::ProtocolError;

/// Errors produced by the receiver and its transfer sessions.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("timed out waiting for the file header")]
    HeaderTimeout,

    #[error("payload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
