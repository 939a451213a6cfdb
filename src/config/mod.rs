//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::domain::{ByteSize, TermSignal};
use crate::error::ConfigError;
use crate::services::{BreachPolicy, SupervisorConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Memory ceiling and enforcement
    pub supervision: SupervisionConfig,
    /// GPU selection settings
    pub gpu: GpuConfig,
}

/// General configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
}

/// Enforcement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisionConfig {
    /// GPU memory ceiling, e.g. "4GB"
    pub limit: ByteSize,
    /// Signal sent when the ceiling is exceeded, e.g. "SIGTERM"
    pub signal: TermSignal,
    /// Sampling interval in milliseconds
    pub interval_ms: u64,
    /// Only warn about breaches, never signal the child
    pub dry_run: bool,
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            limit: ByteSize::from_mib(1),
            signal: TermSignal::default(),
            interval_ms: 100,
            dry_run: false,
        }
    }
}

/// GPU selection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuConfig {
    /// GPU indices to sample; empty means all GPUs
    pub indices: Vec<u32>,
}

impl Config {
    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supervision.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "supervision.interval_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Settings for the supervision loop
    pub fn supervisor_config(&self) -> SupervisorConfig {
        let policy = if self.supervision.dry_run {
            BreachPolicy::Warn
        } else {
            BreachPolicy::Terminate
        };

        SupervisorConfig {
            limit: self.supervision.limit,
            signal: self.supervision.signal,
            interval: Duration::from_millis(self.supervision.interval_ms),
            policy,
            ..SupervisorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.supervision.limit, ByteSize::from_mib(1));
        assert_eq!(config.supervision.signal.signal(), Signal::SIGKILL);
        assert_eq!(config.supervision.interval_ms, 100);
        assert!(config.gpu.indices.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [supervision]
            limit = "2GB"
            signal = "SIGTERM"
            dry_run = true

            [gpu]
            indices = [1]
            "#,
        )
        .unwrap();

        assert_eq!(config.supervision.limit, ByteSize::from_mib(2048));
        assert_eq!(config.supervision.signal.signal(), Signal::SIGTERM);
        assert_eq!(config.supervision.interval_ms, 100);
        assert_eq!(config.gpu.indices, vec![1]);

        let supervisor = config.supervisor_config();
        assert_eq!(supervisor.policy, BreachPolicy::Warn);
        assert_eq!(supervisor.interval, Duration::from_millis(100));
    }

    #[test]
    fn test_reject_bad_values() {
        assert!(toml::from_str::<Config>("[supervision]\nsignal = \"SIGNOPE\"").is_err());
        assert!(toml::from_str::<Config>("[supervision]\nlimit = \"lots\"").is_err());

        let mut config = Config::default();
        config.supervision.interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
