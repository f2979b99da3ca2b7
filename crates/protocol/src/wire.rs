//! TCP wire format for a single file transfer.
//!
//! # Wire format
//!
//! ```text
//! METADATA (Sender -> Receiver):
//!   [2 bytes BE: name_len]
//!   [name_len bytes: file name UTF-8]
//!   [8 bytes BE: file_size]
//!
//! PAYLOAD (Sender -> Receiver):
//!   [one gzip member wrapping the raw file bytes]
//!
//! CHECKSUM (Receiver -> Sender):
//!   [8 bytes BE: CRC32 of the decompressed bytes, upper half zero]
//! ```
//!
//! Exactly one file per connection. The connection closes after the
//! checksum reply.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProtocolError;

/// Metadata sent ahead of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Bare file name as chosen by the sender. Untrusted on the receiver.
    pub name: String,
    /// Size of the uncompressed file in bytes. Advisory only.
    pub size: u64,
}

/// Writes the metadata header to the stream.
pub async fn write_metadata<W: AsyncWrite + Unpin>(
    writer: &mut W,
    metadata: &FileMetadata,
) -> Result<(), ProtocolError> {
    let name_bytes = metadata.name.as_bytes();
    let name_len = name_bytes.len();
    if name_len > u16::MAX as usize {
        return Err(ProtocolError::Protocol(format!(
            "file name too long: {name_len} bytes (max {})",
            u16::MAX
        )));
    }

    writer.write_u16(name_len as u16).await?;
    writer.write_all(name_bytes).await?;
    writer.write_u64(metadata.size).await?;
    Ok(())
}

/// Reads the metadata header from the stream.
///
/// A stream that ends before the header is complete yields an
/// [`UnexpectedEof`](std::io::ErrorKind::UnexpectedEof) I/O error.
pub async fn read_metadata<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<FileMetadata, ProtocolError> {
    let name_len = reader.read_u16().await?;

    let mut name_buf = vec![0u8; name_len as usize];
    reader.read_exact(&mut name_buf).await?;
    let name = String::from_utf8(name_buf)
        .map_err(|e| ProtocolError::Protocol(format!("invalid UTF-8 file name: {e}")))?;

    let size = reader.read_u64().await?;

    Ok(FileMetadata { name, size })
}

/// Writes the receiver's checksum reply and flushes it.
pub async fn write_checksum<W: AsyncWrite + Unpin>(
    writer: &mut W,
    checksum: u32,
) -> Result<(), ProtocolError> {
    writer.write_u64(u64::from(checksum)).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the receiver's checksum reply.
///
/// Returned as the full 64-bit wire value so a reply with non-zero upper
/// bits compares unequal to any local CRC32.
pub async fn read_checksum<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u64, ProtocolError> {
    Ok(reader.read_u64().await?)
}
