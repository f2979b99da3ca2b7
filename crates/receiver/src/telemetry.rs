//! Per-transfer telemetry events.
//!
//! Every transfer session reports exactly one [`TransferEvent`] to a
//! [`TransferSink`] when it closes. Sinks must not block the session.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::session::SessionState;

/// Final status of a transfer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Ok,
    Error {
        /// State the session was in when it failed.
        state: SessionState,
        reason: String,
    },
}

/// One event per transfer session.
#[derive(Debug, Clone)]
pub struct TransferEvent {
    pub session_id: Uuid,
    pub peer: SocketAddr,
    /// File name from the header, if the header was read.
    pub file_name: Option<String>,
    /// Advisory size from the header.
    pub declared_size: Option<u64>,
    /// Uncompressed bytes stored.
    pub bytes: u64,
    /// CRC32 of the stored bytes, once the payload completed.
    pub checksum: Option<u32>,
    pub sampled: bool,
    pub elapsed: Duration,
    pub status: TransferStatus,
}

impl TransferEvent {
    pub fn is_ok(&self) -> bool {
        self.status == TransferStatus::Ok
    }
}

/// Receives transfer events. Implementations must return promptly.
pub trait TransferSink: Send + Sync + 'static {
    fn record(&self, event: &TransferEvent);
}

/// Emits every event as a structured log record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TransferSink for TracingSink {
    fn record(&self, event: &TransferEvent) {
        let file = event.file_name.as_deref().unwrap_or("<unknown>");
        let checksum = event
            .checksum
            .map(|c| format!("{c:08x}"))
            .unwrap_or_default();
        match &event.status {
            TransferStatus::Ok => info!(
                session_id = %event.session_id,
                peer = %event.peer,
                file,
                bytes = event.bytes,
                checksum = %checksum,
                sampled = event.sampled,
                elapsed_ms = event.elapsed.as_millis() as u64,
                status = "OK",
                "file transfer finished"
            ),
            TransferStatus::Error { state, reason } => warn!(
                session_id = %event.session_id,
                peer = %event.peer,
                file,
                bytes = event.bytes,
                state = ?state,
                elapsed_ms = event.elapsed.as_millis() as u64,
                status = "ERROR",
                reason = %reason,
                "file transfer failed"
            ),
        }
    }
}

/// Forwards events over a bounded channel, dropping them when full.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<TransferEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TransferEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl TransferSink for ChannelSink {
    fn record(&self, event: &TransferEvent) {
        if let Err(e) = self.tx.try_send(event.clone()) {
            debug!(session_id = %event.session_id, "telemetry event dropped: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(status: TransferStatus) -> TransferEvent {
        TransferEvent {
            session_id: Uuid::new_v4(),
            peer: "127.0.0.1:40000".parse().unwrap(),
            file_name: Some("a.bin".into()),
            declared_size: Some(3),
            bytes: 3,
            checksum: Some(0x1234_5678),
            sampled: false,
            elapsed: Duration::from_millis(5),
            status,
        }
    }

    #[test]
    fn tracing_sink_accepts_both_statuses() {
        TracingSink.record(&event(TransferStatus::Ok));
        TracingSink.record(&event(TransferStatus::Error {
            state: SessionState::ReceivingPayload,
            reason: "reset".into(),
        }));
    }

    #[tokio::test]
    async fn channel_sink_forwards() {
        let (sink, mut rx) = ChannelSink::channel(4);
        let sent = event(TransferStatus::Ok);
        sink.record(&sent);

        let got = rx.recv().await.unwrap();
        assert_eq!(got.session_id, sent.session_id);
        assert!(got.is_ok());
    }

    #[tokio::test]
    async fn channel_sink_drops_when_full() {
        let (sink, mut rx) = ChannelSink::channel(1);
        sink.record(&event(TransferStatus::Ok));
        sink.record(&event(TransferStatus::Ok));

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_sink_survives_closed_receiver() {
        let (sink, rx) = ChannelSink::channel(1);
        drop(rx);
        sink.record(&event(TransferStatus::Ok));
    }
}
