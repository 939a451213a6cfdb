//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::{Config, ConfigFile};
use crate::domain::{ByteSize, TermSignal};
use crate::error::ConfigError;

use std::path::Path;

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from a file
    ///
    /// An explicit path must load; without one the default locations are
    /// tried and silently skipped when absent.
    pub fn with_file(mut self, path: Option<&Path>) -> Result<Self, ConfigError> {
        let file_config = match path {
            Some(path) => Some(ConfigFile::load(path)?),
            None => ConfigFile::load_default(),
        };

        if let Some(cfg) = file_config {
            self.config = cfg;
        }

        Ok(self)
    }

    /// Override with CLI verbose flag
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.config.general.verbose = true;
        }
        self
    }

    /// Override with CLI memory limit
    pub fn with_limit(mut self, limit: Option<ByteSize>) -> Self {
        if let Some(l) = limit {
            self.config.supervision.limit = l;
        }
        self
    }

    /// Override with CLI termination signal
    pub fn with_signal(mut self, signal: Option<TermSignal>) -> Self {
        if let Some(s) = signal {
            self.config.supervision.signal = s;
        }
        self
    }

    /// Override with CLI sampling interval
    pub fn with_interval(mut self, interval_ms: Option<u64>) -> Self {
        if let Some(i) = interval_ms {
            self.config.supervision.interval_ms = i;
        }
        self
    }

    /// Override with CLI dry-run flag
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        if dry_run {
            self.config.supervision.dry_run = true;
        }
        self
    }

    /// Override with CLI GPU indices
    pub fn with_gpu_indices(mut self, indices: &[u32]) -> Self {
        if !indices.is_empty() {
            self.config.gpu.indices = indices.to_vec();
        }
        self
    }

    /// Build and validate the final configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;
    use std::io::Write;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert!(!config.general.verbose);
        assert!(!config.supervision.dry_run);
        assert_eq!(config.supervision.limit, ByteSize::from_mib(1));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConfigBuilder::new()
            .with_verbose(true)
            .with_dry_run(true)
            .with_limit(Some(ByteSize::from_mib(64)))
            .with_signal(Some(TermSignal::new(Signal::SIGINT)))
            .with_interval(Some(50))
            .with_gpu_indices(&[0, 2])
            .build()
            .unwrap();

        assert!(config.general.verbose);
        assert!(config.supervision.dry_run);
        assert_eq!(config.supervision.limit, ByteSize::from_mib(64));
        assert_eq!(config.supervision.signal.signal(), Signal::SIGINT);
        assert_eq!(config.supervision.interval_ms, 50);
        assert_eq!(config.gpu.indices, vec![0, 2]);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[supervision]\nlimit = \"8GB\"\nsignal = \"SIGTERM\"\n[gpu]\nindices = [3]"
        )
        .unwrap();

        let config = ConfigBuilder::new()
            .with_file(Some(file.path()))
            .unwrap()
            .with_limit(Some(ByteSize::from_mib(2)))
            .with_signal(None)
            .with_gpu_indices(&[])
            .build()
            .unwrap();

        assert_eq!(config.supervision.limit, ByteSize::from_mib(2));
        assert_eq!(config.supervision.signal.signal(), Signal::SIGTERM);
        assert_eq!(config.gpu.indices, vec![3]);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = ConfigBuilder::new().with_file(Some(Path::new("/nonexistent/gml.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = ConfigBuilder::new().with_interval(Some(0)).build();
        assert!(result.is_err());
    }
}
