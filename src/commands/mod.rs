//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod run;

pub use run::run_supervised;
