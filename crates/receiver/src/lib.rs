//! Receiving side of ferry.
//!
//! A [`ReceiverServer`] accepts TCP connections, runs each one through the
//! admission controller, and hands admitted connections to a
//! [`TransferSession`] that stores the decompressed file, optionally writes
//! a sampled copy, and replies with the CRC32 of what it stored.

pub mod error;
pub mod sampling;
pub mod server;
pub mod session;
pub mod storage;
pub mod telemetry;

pub use error::ReceiverError;
pub use sampling::SamplingRate;
pub use server::{ReceiverConfig, ReceiverServer};
pub use session::{SessionState, TransferSession};
pub use storage::StorageLayout;
pub use telemetry::{ChannelSink, TracingSink, TransferEvent, TransferSink, TransferStatus};

use std::time::Duration;

/// Default deadline for the metadata header after a connection is accepted.
pub const HEADER_TIMEOUT: Duration = Duration::from_secs(30);
