//! Error types for a single remote exchange.
//!
//! These cover the transport-level failure modes of one envelope exchange.
//! Two conditions are deliberately *not* errors: a policy refusal is a
//! successful exchange with an unacceptable payload, and cascade exhaustion
//! is returned to callers as a sentinel string. Both are handled as data by
//! the engine.

/// Result type for exchange operations
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Errors that can occur during one request/response exchange
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExchangeError {
    /// No matching response envelope arrived before the deadline
    #[error("Timeout waiting for response")]
    Timeout,

    /// The relay reported an explicit error payload
    #[error("Relay error: {0}")]
    Relay(String),

    /// A response envelope arrived but was missing the expected field
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The response delivery channel closed while a call was in flight
    #[error("Response channel closed")]
    ChannelClosed,
}
