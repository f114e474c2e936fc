//! Retry executor.
//!
//! Wraps a single correlator exchange with bounded retries and linearly
//! increasing backoff. Strategy-agnostic: refusal classification and
//! conversation state are cascade-level concerns; this layer only sees
//! transport outcomes.

use crate::correlate::Correlator;
use sdk::envelope::{RequestEnvelope, ResponseEnvelope};
use sdk::errors::ExchangeError;
use std::time::Duration;
use tracing::{debug, warn};

/// Executes one exchange with up to `max_retries + 1` total attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryExecutor {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryExecutor {
    /// Create an executor with the given retry budget and backoff base.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Run the exchange, rebuilding the envelope for every attempt.
    ///
    /// The delay before attempt `k` (0-indexed) is `base_delay * k`; there
    /// is no delay before the first attempt. Failed attempts are logged and
    /// swallowed; only the final attempt's error propagates.
    pub async fn execute<F>(
        &self,
        correlator: &Correlator,
        build: F,
    ) -> Result<ResponseEnvelope, ExchangeError>
    where
        F: Fn() -> RequestEnvelope,
    {
        let total = self.max_retries + 1;
        let mut last_error = ExchangeError::ChannelClosed;

        for attempt in 0..total {
            if attempt > 0 {
                let delay = self.base_delay * attempt;
                debug!("Backing off {:?} before attempt {}/{}", delay, attempt + 1, total);
                tokio::time::sleep(delay).await;
            }

            match correlator.send(build()).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!("Attempt {}/{} failed: {}", attempt + 1, total, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
