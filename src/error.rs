//! Unified error types for gml
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use crate::domain::ByteSize;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from NVML operations
    #[error("NVML error: {0}")]
    Nvml(#[from] NvmlError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error while supervising the child command
    #[error("{0}")]
    Supervision(#[from] SupervisionError),

    /// Selected GPU index does not exist
    #[error("GPU not found at index {index} ({count} GPU(s) detected)")]
    GpuNotFound { index: u32, count: u32 },
}

/// Errors from NVML wrapper operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NvmlError {
    /// Failed to initialize NVML library
    #[error("Failed to initialize NVML: {0}")]
    InitializationFailed(String),

    /// Failed to shut the NVML session down
    #[error("Failed to shutdown NVML: {0}")]
    ShutdownFailed(String),

    /// NVML library not found
    #[error("NVML library not found. Is the NVIDIA driver installed?")]
    LibraryNotFound,

    /// Device not found at index
    #[error("GPU device not found at index {0}")]
    DeviceNotFound(u32),

    /// Operation not supported by this GPU
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Insufficient permissions
    #[error("Insufficient permissions: {0}. Try running with sudo.")]
    InsufficientPermissions(String),

    /// GPU is lost (fallen off bus, etc.)
    #[error("GPU is lost or has become inaccessible")]
    GpuLost,

    /// Unknown NVML error
    #[error("NVML error: {0}")]
    Unknown(String),
}

/// Errors from domain type validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Byte quantity could not be parsed
    #[error("Invalid size \"{0}\" (expected e.g. 512KB, 1.5GB)")]
    InvalidSize(String),

    /// Signal name could not be resolved
    #[error("Signal \"{0}\" not found")]
    UnknownSignal(String),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Errors raised while running and supervising the child command
#[derive(Error, Debug)]
pub enum SupervisionError {
    /// No command was given after `--`
    #[error("No command given")]
    EmptyCommand,

    /// The command could not be resolved or created
    #[error("Failed to start process \"{command}\": {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the child failed
    #[error("Failed to wait for process {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    /// The task owning the child went away without reporting an exit status
    #[error("Lost track of process {0} before its exit status was collected")]
    WaiterLost(u32),

    /// Sampled usage went over the configured ceiling
    #[error("GPU memory usage {usage} exceeded limit {limit}")]
    LimitExceeded { usage: ByteSize, limit: ByteSize },

    /// A telemetry query failed mid-run
    #[error("Failed to sample GPU memory usage: {0}")]
    Sampling(#[from] NvmlError),

    /// The async runtime could not be built
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_exceeded_display() {
        let err = SupervisionError::LimitExceeded {
            usage: ByteSize::from_bytes(2 * 1024 * 1024),
            limit: ByteSize::from_bytes(1024 * 1024),
        };
        assert_eq!(
            err.to_string(),
            "GPU memory usage 2.00MB exceeded limit 1.00MB"
        );
    }

    #[test]
    fn test_sampling_error_does_not_claim_breach() {
        let err = SupervisionError::Sampling(NvmlError::GpuLost);
        assert!(!err.to_string().contains("exceeded"));
    }

    #[test]
    fn test_nvml_error_display() {
        let err = NvmlError::LibraryNotFound;
        assert!(err.to_string().contains("NVIDIA driver"));
    }

    #[test]
    fn test_error_conversion() {
        let err = SupervisionError::EmptyCommand;
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Supervision(_)));
    }
}
