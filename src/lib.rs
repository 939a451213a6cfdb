//! gml - GPU memory limiter
//!
//! Runs a command as a child process, samples the GPU memory it holds
//! through NVML and terminates it once a ceiling is exceeded. Signals sent
//! to the supervisor are relayed to the child and the child's exit status is
//! propagated.
//!
//! # Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Domain models with validation
//! - [`error`]: Error types
//! - [`nvml`]: NVML abstraction layer
//! - [`services`]: Supervision services

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod nvml;
pub mod services;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
