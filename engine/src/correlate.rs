//! Channel correlator.
//!
//! Sends one request envelope through the relay and resolves the one
//! response envelope carrying a matching correlation token, or times out.
//! Every in-flight call owns exactly one entry in the pending table; the
//! entry is removed on resolution, on timeout, and on caller cancellation,
//! so no listener outlives its call.

use sdk::envelope::{RequestEnvelope, ResponseEnvelope};
use sdk::errors::ExchangeError;
use sdk::relay::Relay;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

/// Buffer size for the inbound response channel
const INBOUND_BUFFER_SIZE: usize = 64;

type PendingTable = Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>;

/// Pairs outbound request envelopes with their inbound responses.
pub struct Correlator {
    relay: Arc<dyn Relay>,
    pending: PendingTable,
    inbound_tx: mpsc::Sender<ResponseEnvelope>,
    deadline: Duration,
}

/// Removes a pending entry when the owning call exits without resolution
/// (timeout or cancellation). Resolution itself removes the entry first, so
/// the drop is a no-op on the success path.
struct PendingGuard {
    pending: PendingTable,
    token: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().expect("pending table lock poisoned");
        pending.remove(&self.token);
    }
}

impl Correlator {
    /// Create a correlator over the given relay with a fixed per-call
    /// deadline. Spawns the background task that routes inbound responses
    /// to their waiting calls.
    pub fn new(relay: Arc<dyn Relay>, deadline: Duration) -> Self {
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER_SIZE);

        tokio::spawn(route_inbound(inbound_rx, Arc::clone(&pending)));

        Self {
            relay,
            pending,
            inbound_tx,
            deadline,
        }
    }

    /// Send one envelope and wait for its matching response.
    ///
    /// Assigns a fresh correlation token, registers the call in the pending
    /// table, dispatches through the relay, and resolves with whichever of
    /// {matching response, deadline} happens first. The losing outcome is a
    /// no-op.
    pub async fn send(
        &self,
        mut envelope: RequestEnvelope,
    ) -> Result<ResponseEnvelope, ExchangeError> {
        let token = next_token();
        envelope.correlation_token = token.clone();

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().expect("pending table lock poisoned");
            pending.insert(token.clone(), tx);
        }
        let _guard = PendingGuard {
            pending: Arc::clone(&self.pending),
            token: token.clone(),
        };

        debug!("Dispatching {:?} ({})", envelope.action, token);
        self.relay
            .dispatch(envelope, self.inbound_tx.clone())
            .await?;

        let response = match tokio::time::timeout(self.deadline, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(ExchangeError::ChannelClosed),
            Err(_) => {
                warn!("No response for {} within {:?}", token, self.deadline);
                return Err(ExchangeError::Timeout);
            }
        };

        if let Some(message) = response.error {
            return Err(ExchangeError::Relay(message));
        }
        if response.data.is_none() {
            return Err(ExchangeError::Malformed(format!(
                "response {} carries neither data nor error",
                token
            )));
        }
        Ok(response)
    }

    /// Number of calls currently awaiting a response.
    pub fn pending_len(&self) -> usize {
        let pending = self.pending.lock().expect("pending table lock poisoned");
        pending.len()
    }

    /// The relay this correlator dispatches through.
    pub fn relay(&self) -> &Arc<dyn Relay> {
        &self.relay
    }
}

/// Route inbound responses to their waiting calls. Responses for tokens no
/// longer tracked (late arrival after a timeout) are dropped.
async fn route_inbound(mut inbound_rx: mpsc::Receiver<ResponseEnvelope>, pending: PendingTable) {
    while let Some(response) = inbound_rx.recv().await {
        let waiter = {
            let mut pending = pending.lock().expect("pending table lock poisoned");
            pending.remove(&response.correlation_token)
        };
        match waiter {
            Some(tx) => {
                // Receiver may have been dropped between timeout and
                // removal; that loss is the documented no-op.
                let _ = tx.send(response);
            }
            None => {
                warn!(
                    "Dropping response for unknown token {}",
                    response.correlation_token
                );
            }
        }
    }
}

/// Generate a process-unique correlation token: monotonic nanosecond clock
/// plus a random component, so collisions are negligible at any realistic
/// request volume and tokens are never reused.
fn next_token() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("tr-{}-{}", nanos, Uuid::new_v4().simple())
}
