//! Logging setup.
//!
//! Installs the global `tracing-subscriber` for the engine. The level comes
//! from `RUST_LOG` when set, otherwise from the configured log level. Debug
//! builds log pretty terminal output; release builds log JSON with span
//! context for ingestion.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber at the given level.
///
/// `RUST_LOG` overrides `log_level` entirely. The subscriber can only be
/// installed once per process; repeated calls are no-ops.
pub fn init_telemetry_with_level(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},{crate_name}={level}",
            level = log_level,
            crate_name = env!("CARGO_CRATE_NAME"),
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    #[cfg(debug_assertions)]
    registry
        .with(fmt::layer().pretty().with_target(false))
        .try_init()
        .ok();

    #[cfg(not(debug_assertions))]
    registry
        .with(fmt::layer().json().with_current_span(true))
        .try_init()
        .ok();
}
