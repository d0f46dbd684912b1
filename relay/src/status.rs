//! Where an oracle's answer comes from.

use flight_surety::oracle::RequestKey;
use flight_surety::{Address, StatusCode};
use flight_surety_core::environment::RandomSource;
use std::sync::Arc;

/// Produces the status code an oracle reports for a request.
pub trait StatusGenerator: Send + Sync {
    /// Status `oracle` reports for `request`
    fn status(&self, oracle: &Address, request: &RequestKey) -> StatusCode;
}

/// Draws each answer uniformly from the known status codes.
#[derive(Clone)]
pub struct RandomStatus {
    rng: Arc<dyn RandomSource>,
}

impl RandomStatus {
    /// Create a generator drawing from `rng`
    #[must_use]
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }
}

impl StatusGenerator for RandomStatus {
    fn status(&self, _oracle: &Address, _request: &RequestKey) -> StatusCode {
        #[allow(clippy::cast_possible_truncation)] // six codes
        let draw = self.rng.below(StatusCode::ALL.len() as u32) as usize;
        StatusCode::ALL
            .get(draw)
            .copied()
            .unwrap_or(StatusCode::Unknown)
    }
}

/// Every oracle reports the same status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedStatus(pub StatusCode);

impl StatusGenerator for FixedStatus {
    fn status(&self, _oracle: &Address, _request: &RequestKey) -> StatusCode {
        self.0
    }
}
