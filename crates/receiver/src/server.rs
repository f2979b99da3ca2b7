//! Receiver accept loop.
//!
//! Binds the configured address, runs every accepted connection through the
//! admission controller, and spawns one [`TransferSession`] per admitted
//! connection. Rejected connections are dropped without a byte exchanged.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ferry_admission::{Admission, AdmissionConfig, AdmissionController};
use ferry_protocol::DEFAULT_PORT;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, error, info, info_span, warn};

use crate::HEADER_TIMEOUT;
use crate::error::ReceiverError;
use crate::sampling::SamplingRate;
use crate::session::TransferSession;
use crate::storage::StorageLayout;
use crate::telemetry::TransferSink;

/// Receiver configuration, already resolved and validated.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Address to listen on (port 0 = OS-assigned).
    pub bind_addr: SocketAddr,
    pub storage: StorageLayout,
    pub sampling_rate: SamplingRate,
    pub admission: AdmissionConfig,
    /// Deadline for the metadata header after accept.
    pub header_timeout: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], DEFAULT_PORT).into(),
            storage: StorageLayout::default(),
            sampling_rate: SamplingRate::default(),
            admission: AdmissionConfig::default(),
            header_timeout: HEADER_TIMEOUT,
        }
    }
}

/// The receiving peer.
pub struct ReceiverServer {
    config: ReceiverConfig,
    admission: AdmissionController,
    sink: Arc<dyn TransferSink>,
    sessions: TaskTracker,
    cancel: CancellationToken,
}

impl ReceiverServer {
    /// Creates a server reporting transfers to `sink`.
    pub fn new(config: ReceiverConfig, sink: Arc<dyn TransferSink>) -> Arc<Self> {
        Arc::new(Self {
            admission: AdmissionController::new(config.admission),
            config,
            sink,
            sessions: TaskTracker::new(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Number of sessions currently running.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Creates the storage directories and binds the listener.
    pub async fn listen(&self) -> Result<TcpListener, ReceiverError> {
        self.config.storage.ensure_dirs().await?;
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let addr = listener.local_addr()?;
        info!(%addr, "receiver listening");
        Ok(listener)
    }

    /// Requests the accept loop to stop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Accepts connections until [`shutdown`](Self::shutdown), then waits
    /// for in-flight sessions to finish.
    pub async fn serve(self: &Arc<Self>, listener: TcpListener) -> Result<(), ReceiverError> {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("receiver shutting down");
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => self.admit(stream, peer),
                        Err(e) => error!("accept error: {e}"),
                    }
                }
            }
        }

        drop(listener);
        self.sessions.close();
        if !self.sessions.is_empty() {
            info!(in_flight = self.sessions.len(), "waiting for transfer sessions");
        }
        self.sessions.wait().await;
        Ok(())
    }

    fn admit(self: &Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        match self.admission.check(peer) {
            Admission::Admitted => {
                info!(%peer, "file request allowed");
                let server = Arc::clone(self);
                self.sessions.spawn(async move { server.handle(stream, peer).await });
            }
            Admission::Rejected { retry_after } => {
                warn!(%peer, ?retry_after, "file request rejected due to rate limiting");
                drop(stream);
            }
        }
    }

    async fn handle(&self, stream: TcpStream, peer: SocketAddr) {
        let session = TransferSession::new(peer);
        let span = info_span!("file_send", session_id = %session.id(), %peer);
        let event = session.run(stream, &self.config).instrument(span).await;
        self.sink.record(&event);
    }
}
