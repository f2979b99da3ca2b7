//! Admission control for inbound connections.
//!
//! A sliding-window counter keyed by peer identity decides whether a newly
//! accepted connection may start a transfer. Every decision happens inside
//! one short critical section shared by all callers.

mod identity;
mod limiter;

pub use identity::{PeerIdentity, PeerKey};
pub use limiter::{Admission, AdmissionConfig, AdmissionController, AdmissionMetrics};

/// Errors produced by the admission crate.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("invalid admission config: {0}")]
    InvalidConfig(String),
}
