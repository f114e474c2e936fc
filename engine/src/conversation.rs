//! Conversation session state machine.
//!
//! Tracks whether a multi-turn session with the backend is open and whether
//! the next exchange must be an "initial" or "continuation" turn. One
//! instance is shared by every request that opts into conversational mode so
//! the system prompt is amortized across many translations; the interior
//! mutex serializes turns so two workers can never both open an "initial"
//! exchange.

use sdk::envelope::CloseNotice;
use sdk::relay::Relay;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    /// No session open; the next exchange is an initial turn.
    Inactive,
    /// A session is open; continuations must echo this id.
    Active { id: String },
}

/// What the next conversational exchange must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnPlan {
    /// True when this exchange opens a new session
    pub is_initial: bool,
    /// Session id to echo on continuation turns
    pub conversation_id: Option<String>,
}

/// Shared conversation state, injected into the cascade.
#[derive(Default)]
pub struct ConversationState {
    inner: Mutex<SessionState>,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Inactive
    }
}

/// Exclusive access to the session for the duration of one exchange.
///
/// Holding the turn across the exchange is what keeps concurrent workers
/// from interleaving `begin`/`reset` into an inconsistent state.
pub struct ConversationTurn<'a> {
    guard: MutexGuard<'a, SessionState>,
}

impl ConversationTurn<'_> {
    /// Plan the next exchange: initial when inactive, continuation when
    /// active.
    pub fn plan(&self) -> TurnPlan {
        match &*self.guard {
            SessionState::Inactive => TurnPlan {
                is_initial: true,
                conversation_id: None,
            },
            SessionState::Active { id } => TurnPlan {
                is_initial: false,
                conversation_id: Some(id.clone()),
            },
        }
    }

    /// Record a successful exchange that returned a session id.
    pub fn activate(&mut self, id: String) {
        debug!("Conversation active (session {})", id);
        *self.guard = SessionState::Active { id };
    }

    /// Clear the session, best-effort notifying the relay to close it.
    ///
    /// The close notice is fire-and-forget; the state is cleared whether or
    /// not the relay accepts it. No-op when already inactive.
    pub async fn reset(&mut self, relay: &dyn Relay) {
        if let SessionState::Active { id } = &*self.guard {
            debug!("Closing conversation session {}", id);
            relay.notify(CloseNotice::new(id.clone())).await;
        }
        *self.guard = SessionState::Inactive;
    }
}

impl ConversationState {
    /// Creates an inactive conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the session for one exchange. Blocks other conversational
    /// workers until the returned turn is dropped.
    pub async fn turn(&self) -> ConversationTurn<'_> {
        ConversationTurn {
            guard: self.inner.lock().await,
        }
    }

    /// Reset the session outside of a held turn (idempotent).
    pub async fn reset(&self, relay: &dyn Relay) {
        let mut turn = self.turn().await;
        turn.reset(relay).await;
    }

    /// True when a session is currently open.
    pub async fn is_active(&self) -> bool {
        matches!(&*self.inner.lock().await, SessionState::Active { .. })
    }

    /// The currently held session id, if any.
    pub async fn session_id(&self) -> Option<String> {
        match &*self.inner.lock().await {
            SessionState::Inactive => None,
            SessionState::Active { id } => Some(id.clone()),
        }
    }
}
