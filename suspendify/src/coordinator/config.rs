//! Coordinator configuration

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Linger used for the automatic suspend issued after a wakeup hook
    #[serde(rename = "wakeup-linger-ms", default = "default_wakeup_linger_ms")]
    pub wakeup_linger_ms: u64,

    /// Longest single sleep step while polling the linger oracle
    #[serde(rename = "poll-ceiling-ms", default = "default_poll_ceiling_ms")]
    pub poll_ceiling_ms: u64,

    /// Backoff base once the oracle has answered for the first time
    #[serde(rename = "backoff-floor-ms", default = "default_backoff_floor_ms")]
    pub backoff_floor_ms: u64,
}

fn default_wakeup_linger_ms() -> u64 {
    debug!("default_wakeup_linger_ms: called");
    3_000
}

fn default_poll_ceiling_ms() -> u64 {
    debug!("default_poll_ceiling_ms: called");
    1_000
}

fn default_backoff_floor_ms() -> u64 {
    debug!("default_backoff_floor_ms: called");
    50
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        debug!("CoordinatorConfig::default: called");
        Self {
            wakeup_linger_ms: 3_000,
            poll_ceiling_ms: 1_000,
            backoff_floor_ms: 50,
        }
    }
}

impl CoordinatorConfig {
    /// Get the wakeup linger as a Duration
    pub fn wakeup_linger(&self) -> Duration {
        Duration::from_millis(self.wakeup_linger_ms)
    }

    /// Get the poll ceiling as a Duration
    pub fn poll_ceiling(&self) -> Duration {
        Duration::from_millis(self.poll_ceiling_ms)
    }

    /// Get the backoff floor as a Duration
    pub fn backoff_floor(&self) -> Duration {
        Duration::from_millis(self.backoff_floor_ms)
    }

    /// Builder-style override of the wakeup linger
    pub fn with_wakeup_linger(mut self, linger: Duration) -> Self {
        self.wakeup_linger_ms = u64::try_from(linger.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Check the backoff settings; zero or inverted bounds would make the
    /// poll loop spin on the oracle
    pub fn validate(&self) -> Result<()> {
        if self.poll_ceiling_ms == 0 {
            return Err(eyre!("poll-ceiling-ms must be greater than zero"));
        }
        if self.backoff_floor_ms == 0 {
            return Err(eyre!("backoff-floor-ms must be greater than zero"));
        }
        if self.backoff_floor_ms > self.poll_ceiling_ms {
            return Err(eyre!(
                "backoff-floor-ms ({}) exceeds poll-ceiling-ms ({})",
                self.backoff_floor_ms,
                self.poll_ceiling_ms
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.wakeup_linger_ms, 3_000);
        assert_eq!(config.poll_ceiling_ms, 1_000);
        assert_eq!(config.backoff_floor_ms, 50);
    }

    #[test]
    fn test_duration_accessors() {
        let config = CoordinatorConfig {
            wakeup_linger_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.wakeup_linger(), Duration::from_millis(250));
        assert_eq!(config.poll_ceiling(), Duration::from_secs(1));
        assert_eq!(config.backoff_floor(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: CoordinatorConfig = serde_yaml::from_str("wakeup-linger-ms: 10").unwrap();
        assert_eq!(config.wakeup_linger_ms, 10);
        assert_eq!(config.poll_ceiling_ms, 1_000);
        assert_eq!(config.backoff_floor_ms, 50);
    }

    #[test]
    fn test_with_wakeup_linger() {
        let config = CoordinatorConfig::default().with_wakeup_linger(Duration::from_millis(120));
        assert_eq!(config.wakeup_linger_ms, 120);

        let config = CoordinatorConfig::default().with_wakeup_linger(Duration::MAX);
        assert_eq!(config.wakeup_linger_ms, u64::MAX);
    }

    #[test]
    fn test_validate_rejects_zero_and_inverted_bounds() {
        assert!(CoordinatorConfig::default().validate().is_ok());

        let zero_ceiling = CoordinatorConfig {
            poll_ceiling_ms: 0,
            ..Default::default()
        };
        assert!(zero_ceiling.validate().is_err());

        let zero_floor = CoordinatorConfig {
            backoff_floor_ms: 0,
            ..Default::default()
        };
        assert!(zero_floor.validate().is_err());

        let inverted = CoordinatorConfig {
            poll_ceiling_ms: 10,
            backoff_floor_ms: 50,
            ..Default::default()
        };
        let err = inverted.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }
}
