use serde::Deserialize;

/// Telemetry configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Service name attached to log output
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub json_logs: bool,
    /// Default `tracing` filter directive (overridden by `RUST_LOG`)
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            json_logs: false,
            log_filter: None,
        }
    }
}

fn default_service_name() -> String {
    "relay".to_owned()
}
