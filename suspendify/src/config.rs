//! Suspendify configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::coordinator::CoordinatorConfig;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transition engine tuning
    pub coordinator: CoordinatorConfig,

    /// Settings for the driver binary
    pub driver: DriverConfig,
}

/// Driver binary configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Remaining grace reported by the driver's linger oracle; unset disables the oracle
    #[serde(rename = "poll-remaining-ms")]
    pub poll_remaining_ms: Option<u64>,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        self.coordinator.validate()
    }

    /// Load and validate configuration
    ///
    /// An explicit path must load. Otherwise the first readable candidate
    /// from [`Config::candidates`] wins, falling back to defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))?
            }
            None => Self::discover(),
        };
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Config locations searched when no path is given, in order:
    /// `./.suspendify.yml`, then `<config_dir>/suspendify/suspendify.yml`
    pub fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".suspendify.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("suspendify").join("suspendify.yml"));
        }
        paths
    }

    fn discover() -> Self {
        for path in Self::candidates().into_iter().filter(|p| p.exists()) {
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable config"),
            }
        }
        info!("No config file found, using defaults");
        Self::default()
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        info!(path = %path.as_ref().display(), "Loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.coordinator.wakeup_linger_ms, 3_000);
        assert!(config.driver.poll_remaining_ms.is_none());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("suspendify.yml");
        fs::write(
            &path,
            "coordinator:\n  wakeup-linger-ms: 1500\ndriver:\n  poll-remaining-ms: 200\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.coordinator.wakeup_linger_ms, 1_500);
        assert_eq!(config.coordinator.poll_ceiling_ms, 1_000);
        assert_eq!(config.driver.poll_remaining_ms, Some(200));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.yml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_load_explicit_malformed_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yml");
        fs::write(&path, "coordinator: [not, a, map]\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_backoff() {
        let mut config = Config::default();
        config.coordinator.poll_ceiling_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.coordinator.backoff_floor_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.coordinator.backoff_floor_ms = 2_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_load_rejects_invalid_backoff() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spin.yml");
        fs::write(&path, "coordinator:\n  poll-ceiling-ms: 0\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("Invalid configuration"), "got: {msg}");
        assert!(msg.contains("poll-ceiling-ms"), "got: {msg}");
    }

    #[test]
    fn test_candidates_start_with_local_file() {
        let candidates = Config::candidates();
        assert_eq!(candidates[0], PathBuf::from(".suspendify.yml"));
        assert!(candidates.iter().skip(1).all(|p| p.ends_with("suspendify/suspendify.yml")));
    }

    #[test]
    fn test_yaml_roundtrip_keeps_kebab_keys() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(yaml.contains("wakeup-linger-ms"));
        assert!(yaml.contains("poll-remaining-ms"));
    }
}
