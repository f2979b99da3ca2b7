//! Single-file sender.
//!
//! Opens one connection, writes the metadata header, streams the file as a
//! gzip member while hashing the raw bytes, then waits for the receiver's
//! checksum reply.

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use ferry_protocol::wire::{read_checksum, write_metadata};
use ferry_protocol::{Compression, FileMetadata, ProtocolError, encode_payload};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::io::SyncIoBridge;
use tracing::{debug, info};

use crate::error::SenderError;

/// Timeout for the TCP connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the checksum reply once the payload is sent.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Knobs for a send.
#[derive(Debug, Clone, Copy)]
pub struct SenderOptions {
    pub compression: Compression,
    pub connect_timeout: Duration,
    pub reply_timeout: Duration,
}

impl Default for SenderOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            connect_timeout: CONNECT_TIMEOUT,
            reply_timeout: REPLY_TIMEOUT,
        }
    }
}

/// Result of a completed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The receiver stored exactly the bytes that were sent.
    Verified { checksum: u32 },
    /// The receiver replied with a different checksum. Not retried.
    Mismatch { local: u32, remote: u64 },
}

impl TransferOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// Sends one file to the receiver at `addr`.
///
/// A checksum mismatch is an `Ok` outcome; errors cover everything that
/// prevented the exchange from completing.
pub async fn send_file(
    addr: SocketAddr,
    path: &Path,
    options: &SenderOptions,
) -> Result<TransferOutcome, SenderError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SenderError::InvalidPath(path.display().to_string()))?
        .to_owned();

    let file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();
    let file = file.into_std().await;

    let stream = match tokio::time::timeout(options.connect_timeout, TcpStream::connect(addr)).await
    {
        Ok(Ok(s)) => s,
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(SenderError::ConnectTimeout),
    };
    debug!(%addr, file = %name, "connected to receiver");

    let (mut reader, mut writer) = stream.into_split();
    write_metadata(&mut writer, &FileMetadata { name: name.clone(), size }).await?;

    let level = options.compression;
    let sink = SyncIoBridge::new(writer);
    let (summary, sink) =
        tokio::task::spawn_blocking(move || encode_payload(file, sink, level)).await??;

    // Half-close so the receiver sees the end of the stream after the trailer.
    let mut writer = sink.into_inner();
    writer.shutdown().await?;

    let remote = match tokio::time::timeout(options.reply_timeout, read_checksum(&mut reader)).await
    {
        Ok(Ok(remote)) => remote,
        Ok(Err(ProtocolError::Io(e))) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(SenderError::ClosedWithoutReply);
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(SenderError::ReplyTimeout),
    };

    let outcome = if remote == u64::from(summary.checksum) {
        TransferOutcome::Verified {
            checksum: summary.checksum,
        }
    } else {
        TransferOutcome::Mismatch {
            local: summary.checksum,
            remote,
        }
    };

    info!(
        file = %name,
        bytes = summary.bytes,
        checksum = %format!("{:08x}", summary.checksum),
        verified = outcome.is_verified(),
        "file sent"
    );
    Ok(outcome)
}
