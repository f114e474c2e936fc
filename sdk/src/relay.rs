//! Relay collaborator trait.
//!
//! The relay is the component that actually performs the outbound network
//! call. The engine hands it a [`RequestEnvelope`] together with a
//! [`ResponseSink`]; the relay is expected to deliver at most one
//! [`ResponseEnvelope`] carrying the same correlation token onto the sink.
//! At-most-once delivery is assumed, not enforced: a second delivery for a
//! token the engine no longer tracks is silently dropped on the engine side.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::envelope::{CloseNotice, RequestEnvelope, ResponseEnvelope};
use crate::errors::ExchangeError;

/// Channel on which relays deliver response envelopes back to the engine.
pub type ResponseSink = mpsc::Sender<ResponseEnvelope>;

/// A transport collaborator that carries envelopes to the backend.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Carry one request envelope to the backend.
    ///
    /// Returns `Err` only for dispatch failures (the request never left).
    /// Backend-side failures are reported as a [`ResponseEnvelope`] with an
    /// `error` payload delivered on `replies`.
    async fn dispatch(
        &self,
        envelope: RequestEnvelope,
        replies: ResponseSink,
    ) -> Result<(), ExchangeError>;

    /// Fire-and-forget conversation close notification.
    ///
    /// No response is awaited and failures must not propagate; the default
    /// implementation ignores the notice entirely.
    async fn notify(&self, _notice: CloseNotice) {}
}
