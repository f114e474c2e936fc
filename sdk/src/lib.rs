//! Polyglot SDK
//!
//! Shared library providing the envelope types, relay trait, and error
//! taxonomy used by the Polyglot engine and by relay implementations.
//! This crate defines the boundary between the orchestration core and the
//! transport that actually performs the outbound call.

/// Error types and handling
pub mod errors;

/// Request/response envelope types
pub mod envelope;

/// Relay collaborator trait
pub mod relay;

// Re-export commonly used types
pub use envelope::{
    Action, CloseNotice, GenerationOptions, RequestEnvelope, RequestPayload, ResponseData,
    ResponseEnvelope,
};
pub use errors::ExchangeError;
pub use relay::{Relay, ResponseSink};
