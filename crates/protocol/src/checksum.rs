//! CRC32 accumulating stream adapters.
//!
//! Both adapters checksum the bytes that pass through them, never the
//! bytes of the layer underneath, so wrapping a decoder (or an encoder)
//! checksums the uncompressed content.

use std::io::{self, Read, Write};

use crc32fast::Hasher;

/// Checksum and length of a stream once it has been fully consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSummary {
    /// CRC32 (IEEE) of the uncompressed bytes.
    pub checksum: u32,
    /// Number of uncompressed bytes.
    pub bytes: u64,
}

/// Computes the CRC32 of an in-memory buffer.
pub fn checksum_bytes(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// A reader that checksums everything read through it.
pub struct ChecksumReader<R> {
    inner: R,
    hasher: Hasher,
    bytes: u64,
}

impl<R: Read> ChecksumReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Hasher::new(),
            bytes: 0,
        }
    }

    /// Checksum and byte count of everything read so far.
    pub fn summary(&self) -> PayloadSummary {
        PayloadSummary {
            checksum: self.hasher.clone().finalize(),
            bytes: self.bytes,
        }
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }
}

/// A writer that checksums everything accepted by the inner writer.
pub struct ChecksumWriter<W> {
    inner: W,
    hasher: Hasher,
    bytes: u64,
}

impl<W: Write> ChecksumWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Hasher::new(),
            bytes: 0,
        }
    }

    /// Checksum and byte count of everything written so far.
    pub fn summary(&self) -> PayloadSummary {
        PayloadSummary {
            checksum: self.hasher.clone().finalize(),
            bytes: self.bytes,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Only the prefix the inner writer took counts.
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
