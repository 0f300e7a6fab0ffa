//! # Orchestrator Settings
//!
//! Which systems to boot, and how to react when some of them fail.
//!
//! ## File Format
//!
//! ```toml
//! halt_on_boot_failure = false
//! anchor_phase = "script-run-update"
//! init_timeout_ms = 5000
//!
//! [[systems]]
//! kind = "audio"
//!
//! [[systems]]
//! kind = "telemetry-uplink"
//! enabled = false
//! ```
//!
//! Exactly one `*.orchestrator.toml` file is expected in the settings
//! directory; see [`SettingsLoader`].

mod loader;

pub use loader::{SettingsLoader, SETTINGS_SUFFIX};

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use orch_scheduler::PipelinePhase;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::system::SystemKind;

/// One entry of the configured system list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEntry {
    pub kind: SystemKind,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl SystemEntry {
    pub fn enabled(kind: impl Into<SystemKind>) -> Self {
        Self {
            kind: kind.into(),
            enabled: true,
        }
    }

    pub fn disabled(kind: impl Into<SystemKind>) -> Self {
        Self {
            kind: kind.into(),
            enabled: false,
        }
    }
}

/// Boot configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    /// The configured systems, in boot order. `None` when the settings file
    /// has no `systems` key at all.
    #[serde(default, rename = "systems")]
    pub system_list: Option<Vec<SystemEntry>>,

    /// Skip wiring entirely if any system fails to initialize.
    #[serde(default)]
    pub halt_on_boot_failure: bool,

    /// Built-in phase the systems group is inserted before.
    #[serde(default)]
    pub anchor_phase: PipelinePhase,

    /// Per-system init deadline. Unset means wait indefinitely.
    #[serde(default)]
    pub init_timeout_ms: Option<u64>,
}

impl OrchestratorSettings {
    /// Settings for an explicit system list, everything else default.
    pub fn with_systems(systems: Vec<SystemEntry>) -> Self {
        Self {
            system_list: Some(systems),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn halt_on_boot_failure(mut self, halt: bool) -> Self {
        self.halt_on_boot_failure = halt;
        self
    }

    #[must_use]
    pub fn anchor_phase(mut self, phase: PipelinePhase) -> Self {
        self.anchor_phase = phase;
        self
    }

    #[must_use]
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.init_timeout_ms.map(Duration::from_millis)
    }

    /// The system list, or [`ConfigError::MissingSystemList`].
    pub fn systems(&self) -> Result<&[SystemEntry], ConfigError> {
        self.system_list.as_deref().ok_or(ConfigError::MissingSystemList)
    }

    /// Apply overrides from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ORCH_HALT_ON_BOOT_FAILURE`: `1`/`true` or `0`/`false`
    /// - `ORCH_ANCHOR_PHASE`: phase name, e.g. `pre-late-update`
    /// - `ORCH_INIT_TIMEOUT_MS`: per-system init deadline in milliseconds
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = env::var("ORCH_HALT_ON_BOOT_FAILURE") {
            self.halt_on_boot_failure = parse_flag("ORCH_HALT_ON_BOOT_FAILURE", &val)?;
            info!("[Settings] halt_on_boot_failure overridden from environment");
        }

        if let Ok(val) = env::var("ORCH_ANCHOR_PHASE") {
            self.anchor_phase = val.parse().map_err(|reason| ConfigError::InvalidOverride {
                key: "ORCH_ANCHOR_PHASE",
                reason,
            })?;
            info!("[Settings] anchor_phase overridden from environment");
        }

        if let Ok(val) = env::var("ORCH_INIT_TIMEOUT_MS") {
            let ms = val.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                key: "ORCH_INIT_TIMEOUT_MS",
                reason: format!("'{val}' is not a number of milliseconds"),
            })?;
            self.init_timeout_ms = Some(ms);
            info!("[Settings] init_timeout_ms overridden from environment");
        }

        Ok(())
    }
}

fn parse_flag(key: &'static str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ConfigError::InvalidOverride {
            key,
            reason: format!("'{val}' is not a boolean"),
        }),
    }
}

/// Configuration errors. All of them abort the boot before any system is
/// constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no settings file (*{}) found in {}. Did you create one?", SETTINGS_SUFFIX, .dir.display())]
    MissingSettings { dir: PathBuf },

    #[error("found {} settings files in {}, there should only be one: {files:?}", .files.len(), .dir.display())]
    DuplicateSettings { dir: PathBuf, files: Vec<PathBuf> },

    #[error("no system list specified. Add a [[systems]] table to the settings file")]
    MissingSystemList,

    #[error("failed to read {}: {error}", .path.display())]
    Io { path: PathBuf, error: String },

    #[error("failed to parse {}: {error}", .path.display())]
    Parse { path: PathBuf, error: String },

    #[error("invalid value for {key}: {reason}")]
    InvalidOverride { key: &'static str, reason: String },
}
