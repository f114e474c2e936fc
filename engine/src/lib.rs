//! Polyglot Engine Library
//!
//! This library provides the core functionality of the Polyglot translation
//! orchestration engine. It is used by both the main binary and integration
//! tests.

/// Configuration management module
pub mod config;

/// Response classification: cache keys, cleanup, refusal detection
pub mod classify;

/// Channel correlator pairing request envelopes with responses
pub mod correlate;

/// Retry executor with linear backoff
pub mod retry;

/// Conversation session state machine
pub mod conversation;

/// Declarative prompt strategy ladder
pub mod strategy;

/// Translation result cache
pub mod cache;

/// Strategy cascade driving a single translation to acceptance
pub mod cascade;

/// Bounded-concurrency batch scheduler
pub mod scheduler;

/// Reference HTTP relay adapter
pub mod relay;

/// Logging setup
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers for CLI operations
pub mod handlers;
