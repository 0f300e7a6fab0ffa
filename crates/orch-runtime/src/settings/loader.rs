//! Settings discovery and parsing.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{ConfigError, OrchestratorSettings};

/// File name suffix that marks an orchestrator settings file.
pub const SETTINGS_SUFFIX: &str = ".orchestrator.toml";

/// Loads [`OrchestratorSettings`] from TOML.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Find the single settings file in `dir` and load it.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingSettings`] if no `*.orchestrator.toml` exists
    /// - [`ConfigError::DuplicateSettings`] if more than one exists
    /// - [`ConfigError::Io`] / [`ConfigError::Parse`] if it cannot be loaded
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<OrchestratorSettings, ConfigError> {
        let dir = dir.as_ref();
        let files = Self::settings_files(dir)?;

        match files.as_slice() {
            [] => Err(ConfigError::MissingSettings {
                dir: dir.to_path_buf(),
            }),
            [path] => {
                info!("[Settings] Using {}", path.display());
                Self::load(path)
            }
            _ => Err(ConfigError::DuplicateSettings {
                dir: dir.to_path_buf(),
                files,
            }),
        }
    }

    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<OrchestratorSettings, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse settings from a TOML string.
    pub fn parse(content: &str) -> Result<OrchestratorSettings, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    fn settings_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let io_error = |e: std::io::Error| ConfigError::Io {
            path: dir.to_path_buf(),
            error: e.to_string(),
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            let is_settings = path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(SETTINGS_SUFFIX));
            if is_settings {
                debug!("[Settings] Found candidate {}", path.display());
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SystemEntry;
    use orch_scheduler::PipelinePhase;

    const SAMPLE: &str = r#"
        halt_on_boot_failure = true
        anchor_phase = "pre-late-update"
        init_timeout_ms = 1500

        [[systems]]
        kind = "audio"

        [[systems]]
        kind = "network"
        enabled = false
    "#;

    #[test]
    fn test_parse_full_file() {
        let settings = SettingsLoader::parse(SAMPLE).unwrap();
        assert!(settings.halt_on_boot_failure);
        assert_eq!(settings.anchor_phase, PipelinePhase::PreLateUpdate);
        assert_eq!(settings.init_timeout_ms, Some(1500));
        assert_eq!(
            settings.systems().unwrap(),
            &[SystemEntry::enabled("audio"), SystemEntry::disabled("network")]
        );
    }

    #[test]
    fn test_parse_without_systems_key() {
        let settings = SettingsLoader::parse("halt_on_boot_failure = false").unwrap();
        assert!(settings.system_list.is_none());
    }

    #[test]
    fn test_parse_empty_list_is_not_missing() {
        let settings = SettingsLoader::parse("systems = []").unwrap();
        assert_eq!(settings.systems().unwrap().len(), 0);
    }

    #[test]
    fn test_parse_rejects_unknown_phase() {
        let err = SettingsLoader::parse(r#"anchor_phase = "lunch""#).unwrap_err();
        assert!(err.contains("lunch") || err.contains("variant"));
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("game.orchestrator.toml"), SAMPLE).unwrap();
        fs::write(dir.path().join("notes.toml"), "ignored = true").unwrap();

        let settings = SettingsLoader::discover(dir.path()).unwrap();
        assert_eq!(settings.systems().unwrap().len(), 2);
    }

    #[test]
    fn test_discover_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = SettingsLoader::discover(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSettings { .. }));
    }

    #[test]
    fn test_discover_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.orchestrator.toml"), SAMPLE).unwrap();
        fs::write(dir.path().join("b.orchestrator.toml"), SAMPLE).unwrap();

        match SettingsLoader::discover(dir.path()).unwrap_err() {
            ConfigError::DuplicateSettings { files, .. } => assert_eq!(files.len(), 2),
            other => panic!("Expected DuplicateSettings, got {:?}", other),
        }
    }

    #[test]
    fn test_discover_unreadable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = SettingsLoader::discover(dir.path().join("does-not-exist")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.orchestrator.toml");
        fs::write(&path, "halt_on_boot_failure = \"sometimes\"").unwrap();

        match SettingsLoader::load(&path).unwrap_err() {
            ConfigError::Parse { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }
}
