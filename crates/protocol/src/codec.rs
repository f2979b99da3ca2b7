//! Streaming gzip payload codec.
//!
//! The stages compose in a fixed order:
//!
//! ```text
//! send:    source -> ChecksumWriter -> GzEncoder -> socket
//! receive: socket -> GzDecoder -> ChecksumReader -> sink
//! ```
//!
//! Both functions are blocking and are meant to run on a blocking thread
//! over a sync bridge of the socket.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::TRANSFER_BUFFER_SIZE;
use crate::checksum::{ChecksumReader, ChecksumWriter, PayloadSummary};
use crate::error::ProtocolError;

/// Compresses `source` onto `sink` as a single gzip member.
///
/// Returns the summary of the uncompressed bytes and the sink, with the
/// gzip trailer written and flushed.
pub fn encode_payload<R: Read, W: Write>(
    mut source: R,
    sink: W,
    level: Compression,
) -> Result<(PayloadSummary, W), ProtocolError> {
    let mut writer = ChecksumWriter::new(GzEncoder::new(sink, level));
    let mut buf = vec![0u8; TRANSFER_BUFFER_SIZE];

    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buf[..n])?;
    }

    let summary = writer.summary();
    let mut sink = writer.into_inner().finish()?;
    sink.flush()?;
    Ok((summary, sink))
}

/// Decompresses one gzip member from `source` into `sink`.
///
/// Reads until the decoder reports the end of the member; the advisory
/// file size is never consulted. Errors reading or decoding the source are
/// reported as [`ProtocolError::Decode`], errors from the sink as
/// [`ProtocolError::Io`].
pub fn decode_payload<R: Read, W: Write>(
    source: R,
    sink: &mut W,
) -> Result<PayloadSummary, ProtocolError> {
    let mut wire = WireCounter {
        inner: source,
        bytes: 0,
    };
    let mut reader = ChecksumReader::new(GzDecoder::new(&mut wire));
    let mut buf = vec![0u8; TRANSFER_BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProtocolError::Decode(e)),
        };
        sink.write_all(&buf[..n])?;
    }
    let summary = reader.summary();
    drop(reader);

    // A closed connection with no payload at all is not an empty file.
    if wire.bytes == 0 {
        return Err(ProtocolError::Decode(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "payload stream ended before the gzip header",
        )));
    }

    sink.flush()?;
    Ok(summary)
}

/// Counts compressed bytes pulled from the wire.
struct WireCounter<R> {
    inner: R,
    bytes: u64,
}

impl<R: Read> Read for WireCounter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes += n as u64;
        Ok(n)
    }
}
