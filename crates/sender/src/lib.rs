//! Sending side of ferry.
//!
//! Every file travels on its own connection: metadata header, gzip payload,
//! then the receiver's CRC32 reply is compared with the CRC32 computed
//! locally over the raw bytes.

pub mod client;
pub mod error;
pub mod pipeline;

pub use client::{SenderOptions, TransferOutcome, send_file};
pub use error::SenderError;
pub use pipeline::{FileReport, FileStatus, send_files, source_files};
