//! # Orch Telemetry
//!
//! Logging bootstrap for the orchestrator binaries and test harnesses.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orch_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! tracing::info!("[Boot] Loading systems...");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ORCH_SERVICE_NAME` | `orchestrator` | Service name in the startup line |
//! | `ORCH_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `ORCH_JSON_LOGS` | `false` | JSON line output |
//! | `ORCH_LOG_TARGETS` | `true` | Include module targets |

mod config;
mod logging;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Install the global tracing subscriber.
///
/// Fails with [`TelemetryError::SubscriberInit`] if a global subscriber was
/// already installed (for example by a test harness).
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard held for the lifetime of the application.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
