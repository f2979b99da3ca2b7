//! Wire protocol shared by the ferry sender and receiver.
//!
//! One file per TCP connection: a metadata header, a gzip-compressed
//! payload, and a CRC32 reply computed by the receiver over the
//! decompressed bytes.
//!
//! # Wire format
//!
//! See [`wire`] module for the byte layout.

pub mod checksum;
pub mod codec;
pub mod error;
mod name;
pub mod wire;

pub use checksum::{ChecksumReader, ChecksumWriter, PayloadSummary, checksum_bytes};
pub use codec::{decode_payload, encode_payload};
pub use error::ProtocolError;
pub use flate2::Compression;
pub use name::validate_file_name;
pub use wire::FileMetadata;

/// Default TCP port of the receiver.
pub const DEFAULT_PORT: u16 = 25565;

/// Chunk size used when streaming payload bytes (64 KB).
///
/// Not visible on the wire.
pub const TRANSFER_BUFFER_SIZE: usize = 64 * 1024;
