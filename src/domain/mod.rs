//! Domain models for gml
//!
//! This module contains all domain types with validation.
//! Types are validated on construction (fail-fast pattern).

pub mod process;
pub mod signal;
pub mod size;

pub use process::{GpuProcess, ProcessType};
pub use signal::TermSignal;
pub use size::ByteSize;
