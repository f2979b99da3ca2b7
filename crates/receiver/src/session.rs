//! Per-connection transfer session.
//!
//! ```text
//! AwaitingHeader -> ReceivingPayload -> SendingChecksum -> Closed
//!        \________________\___________________\_________-> Errored
//! ```
//!
//! A session owns its socket and files exclusively and releases them on
//! every exit path. It never touches state shared with other sessions.

use std::fmt;
use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;

use ferry_protocol::wire::{read_metadata, write_checksum};
use ferry_protocol::{FileMetadata, PayloadSummary, decode_payload};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::io::SyncIoBridge;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::ReceiverError;
use crate::server::ReceiverConfig;
use crate::storage::SampleTee;
use crate::telemetry::{TransferEvent, TransferStatus};

/// Lifecycle state of a transfer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHeader,
    ReceivingPayload,
    SendingChecksum,
    Closed,
    Errored,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AwaitingHeader => "awaiting header",
            Self::ReceivingPayload => "receiving payload",
            Self::SendingChecksum => "sending checksum",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// One accepted connection, handled end to end.
#[derive(Debug)]
pub struct TransferSession {
    id: Uuid,
    peer: SocketAddr,
    state: SessionState,
    metadata: Option<FileMetadata>,
    sampled: bool,
    bytes: u64,
    checksum: Option<u32>,
}

impl TransferSession {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            state: SessionState::AwaitingHeader,
            metadata: None,
            sampled: false,
            bytes: 0,
            checksum: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session to completion and returns its telemetry event.
    ///
    /// Never fails: every error is folded into the event status.
    pub async fn run(mut self, stream: TcpStream, config: &ReceiverConfig) -> TransferEvent {
        let started = Instant::now();

        let status = match self.drive(stream, config).await {
            Ok(()) => {
                self.state = SessionState::Closed;
                TransferStatus::Ok
            }
            Err(e) => {
                let failed_in = self.state;
                self.state = SessionState::Errored;
                error!(state = %failed_in, "transfer session failed: {e}");
                TransferStatus::Error {
                    state: failed_in,
                    reason: e.to_string(),
                }
            }
        };

        TransferEvent {
            session_id: self.id,
            peer: self.peer,
            file_name: self.metadata.as_ref().map(|m| m.name.clone()),
            declared_size: self.metadata.as_ref().map(|m| m.size),
            bytes: self.bytes,
            checksum: self.checksum,
            sampled: self.sampled,
            elapsed: started.elapsed(),
            status,
        }
    }

    async fn drive(
        &mut self,
        stream: TcpStream,
        config: &ReceiverConfig,
    ) -> Result<(), ReceiverError> {
        let (mut reader, mut writer) = stream.into_split();

        // Header.
        self.state = SessionState::AwaitingHeader;
        let metadata = tokio::time::timeout(config.header_timeout, read_metadata(&mut reader))
            .await
            .map_err(|_| ReceiverError::HeaderTimeout)??;
        self.metadata = Some(metadata.clone());

        let output = config.storage.output_path(&metadata.name)?;
        self.sampled = config.sampling_rate.decide();
        let sample = if self.sampled {
            Some(config.storage.sample_path(&metadata.name)?)
        } else {
            None
        };
        info!(
            file = %metadata.name,
            declared_size = metadata.size,
            sampled = self.sampled,
            "receiving file"
        );

        // Payload.
        self.state = SessionState::ReceivingPayload;
        let source = SyncIoBridge::new(reader);
        let summary =
            tokio::task::spawn_blocking(move || receive_to_disk(source, output, sample)).await??;
        self.bytes = summary.bytes;
        self.checksum = Some(summary.checksum);
        debug!(
            bytes = summary.bytes,
            checksum = %format!("{:08x}", summary.checksum),
            "payload stored"
        );

        // Reply. The file is already stored if this fails.
        self.state = SessionState::SendingChecksum;
        write_checksum(&mut writer, summary.checksum).await?;
        writer.shutdown().await?;

        info!(file = %metadata.name, bytes = summary.bytes, "file received successfully");
        Ok(())
    }
}

/// Decodes the payload into the output file (and sample file, if any).
///
/// Runs on a blocking thread.
fn receive_to_disk(
    source: impl Read,
    output: PathBuf,
    sample: Option<PathBuf>,
) -> Result<PayloadSummary, ReceiverError> {
    let mut sink = SampleTee::create(&output, sample.as_deref())?;
    let summary = decode_payload(source, &mut sink)?;
    sink.finish()?;
    Ok(summary)
}
