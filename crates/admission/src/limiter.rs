use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::AdmissionError;
use crate::identity::{PeerIdentity, PeerKey};

/// Default number of admissions per identity within one window.
const DEFAULT_MAX_REQUESTS: u32 = 5;

/// Default window length.
const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Validated limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionConfig {
    max_requests: u32,
    window: Duration,
    identity: PeerIdentity,
}

impl AdmissionConfig {
    /// Builds a config, rejecting a zero request budget or an empty window.
    pub fn new(
        max_requests: u32,
        window: Duration,
        identity: PeerIdentity,
    ) -> Result<Self, AdmissionError> {
        if max_requests == 0 {
            return Err(AdmissionError::InvalidConfig(
                "max_requests must be at least 1".into(),
            ));
        }
        if window.is_zero() {
            return Err(AdmissionError::InvalidConfig(
                "time window must be non-zero".into(),
            ));
        }
        Ok(Self {
            max_requests,
            window,
            identity,
        })
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn identity(&self) -> PeerIdentity {
        self.identity
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
            identity: PeerIdentity::default(),
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// The identity used its whole budget; its oldest admission leaves the
    /// window after `retry_after`.
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Running totals of admission decisions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionMetrics {
    pub admitted: u64,
    pub rejected: u64,
}

/// Sliding-window admission controller, shared by the accept loop.
pub struct AdmissionController {
    config: AdmissionConfig,
    state: Mutex<WindowState>,
}

#[derive(Default)]
struct WindowState {
    /// Admission timestamps per identity, oldest first.
    admitted: HashMap<PeerKey, VecDeque<Instant>>,
    metrics: AdmissionMetrics,
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            config,
            state: Mutex::new(WindowState::default()),
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Decides whether a new connection from `peer` is admitted now.
    pub fn check(&self, peer: SocketAddr) -> Admission {
        self.check_at(peer, Instant::now())
    }

    /// Decides whether a new connection from `peer` is admitted at `now`.
    ///
    /// Prunes every stale timestamp (age `>= window`) across all
    /// identities, drops identities left empty, then admits iff the
    /// identity has fewer than `max_requests` admissions left in the
    /// window. Only admissions are recorded.
    pub fn check_at(&self, peer: SocketAddr, now: Instant) -> Admission {
        let key = self.config.identity.key(peer);
        let window = self.config.window;

        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *guard;

        state.admitted.retain(|_, stamps| {
            while stamps
                .front()
                .is_some_and(|t| now.saturating_duration_since(*t) >= window)
            {
                stamps.pop_front();
            }
            !stamps.is_empty()
        });

        let stamps = state.admitted.entry(key).or_default();
        if stamps.len() < self.config.max_requests as usize {
            stamps.push_back(now);
            let in_window = stamps.len();
            state.metrics.admitted += 1;
            debug!(peer = %key, in_window, "connection admitted");
            Admission::Admitted
        } else {
            let retry_after = stamps
                .front()
                .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or_default();
            state.metrics.rejected += 1;
            debug!(peer = %key, ?retry_after, "connection rejected by rate limit");
            Admission::Rejected { retry_after }
        }
    }

    /// Returns a snapshot of the decision counters.
    pub fn metrics(&self) -> AdmissionMetrics {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .metrics
    }

    /// Number of identities currently holding at least one admission.
    ///
    /// Stale identities are only pruned by [`check_at`](Self::check_at).
    pub fn tracked_peers(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .admitted
            .len()
    }
}
