//! Telemetry for Relay
//!
//! Structured logging via the `tracing` ecosystem. The subscriber is
//! installed once by the binary; feature crates only use the `tracing`
//! macros.

use relay_config::TelemetryConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber from configuration
///
/// `RUST_LOG` wins over the configured filter; the fallback is `info`.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed
pub fn init(config: Option<&TelemetryConfig>) -> anyhow::Result<()> {
    let configured_filter = config.and_then(|c| c.log_filter.as_deref()).unwrap_or("info");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if config.is_some_and(|c| c.json_logs) {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;
    }

    if let Some(config) = config {
        tracing::debug!(service_name = %config.service_name, "telemetry initialized");
    }

    Ok(())
}
