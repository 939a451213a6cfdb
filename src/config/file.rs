//! Configuration file loading
//!
//! Handles loading configuration from TOML files.

use crate::config::Config;
use crate::error::ConfigError;

use std::path::{Path, PathBuf};

/// Configuration file handler
pub struct ConfigFile;

impl ConfigFile {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    ///
    /// A file that exists but does not parse is reported and skipped.
    pub fn load_default() -> Option<Config> {
        let (config, skipped) = Self::load_first(&Self::default_paths());
        for (path, e) in &skipped {
            log::warn!("Ignoring {}: {}", path.display(), e);
        }
        config
    }

    /// Load the first of `paths` that exists and parses
    ///
    /// Returns the loaded config along with the files that exist but could
    /// not be used.
    pub fn load_first(paths: &[PathBuf]) -> (Option<Config>, Vec<(PathBuf, ConfigError)>) {
        let mut skipped = Vec::new();
        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load(path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    return (Some(config), skipped);
                }
                Err(e) => skipped.push((path.clone(), e)),
            }
        }
        (None, skipped)
    }

    /// Get default configuration file paths
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/gml/config.toml")];

        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("gml").join("config.toml"));
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_paths_not_empty() {
        let paths = ConfigFile::default_paths();
        assert!(!paths.is_empty());
        assert!(paths.iter().all(|p| p.ends_with("config.toml")));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigFile::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[supervision]\nlimit = \"512KB\"\ninterval_ms = 250").unwrap();

        let config = ConfigFile::load(file.path()).unwrap();
        assert_eq!(config.supervision.limit.as_bytes(), 512 * 1024);
        assert_eq!(config.supervision.interval_ms, 250);
    }

    #[test]
    fn test_load_first_skips_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        let good = dir.path().join("good.toml");
        std::fs::write(&broken, "[supervision\nlimit = ").unwrap();
        std::fs::write(&good, "[supervision]\ninterval_ms = 40\n").unwrap();
        let paths = vec![dir.path().join("absent.toml"), broken.clone(), good];

        let (config, skipped) = ConfigFile::load_first(&paths);
        assert_eq!(config.unwrap().supervision.interval_ms, 40);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, broken);
        assert!(matches!(skipped[0].1, ConfigError::TomlError(_)));
    }

    #[test]
    fn test_load_first_nothing_usable() {
        let dir = tempfile::tempdir().unwrap();
        let (config, skipped) = ConfigFile::load_first(&[dir.path().join("absent.toml")]);
        assert!(config.is_none());
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[supervision\nlimit = ").unwrap();
        assert!(matches!(
            ConfigFile::load(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }
}
