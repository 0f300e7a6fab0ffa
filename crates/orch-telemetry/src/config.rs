//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` expression such as `orch_runtime=debug,info`)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to include the event target (module path) in each line
    pub with_targets: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "orchestrator".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_targets: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ORCH_SERVICE_NAME`: Service name (default: orchestrator)
    /// - `ORCH_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `ORCH_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `ORCH_LOG_TARGETS`: Include targets (default: true)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("ORCH_SERVICE_NAME")
                .unwrap_or_else(|_| "orchestrator".to_string()),

            log_level: env::var("ORCH_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("ORCH_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),

            with_targets: env::var("ORCH_LOG_TARGETS")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}
