//! Logging for Relay
//!
//! Structured logging via the `tracing` ecosystem. Call [`init`] once
//! at startup; log output goes to stderr with an `RUST_LOG`-style
//! filter.

/// Initialize the tracing subscriber
///
/// `log_filter` is the default directive (e.g. `"info"`), overridable
/// at runtime through the `RUST_LOG` environment variable.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(log_filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))?;

    Ok(())
}
