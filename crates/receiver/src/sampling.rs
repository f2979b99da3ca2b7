//! Probabilistic sampling of received files.

use rand::Rng;

use crate::error::ReceiverError;

/// Probability that a session also writes a diagnostic copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingRate(f64);

impl SamplingRate {
    /// Never sample.
    pub const NEVER: Self = Self(0.0);

    /// Sample every session.
    pub const ALWAYS: Self = Self(1.0);

    /// Builds a rate from a probability in `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self, ReceiverError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ReceiverError::InvalidConfig(format!(
                "sampling rate must be within [0, 1], got {probability}"
            )));
        }
        Ok(Self(probability))
    }

    pub fn probability(self) -> f64 {
        self.0
    }

    /// Draws one sampling decision from the thread-local RNG.
    pub fn decide(self) -> bool {
        self.decide_with(&mut rand::thread_rng())
    }

    /// Draws one sampling decision from `rng`.
    pub fn decide_with<R: Rng + ?Sized>(self, rng: &mut R) -> bool {
        rng.gen_bool(self.0)
    }
}

impl Default for SamplingRate {
    fn default() -> Self {
        Self::NEVER
    }
}
