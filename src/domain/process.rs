//! Process telemetry domain types
//!
//! One row of a device's running-process list, as reported by the driver.

use crate::domain::ByteSize;
use std::fmt;

/// A process holding a context on a GPU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuProcess {
    /// Process ID as seen by the driver
    pub pid: u32,
    /// GPU memory attributed to this context
    pub used_memory: ByteSize,
    /// Context type the row came from
    pub process_type: ProcessType,
}

impl GpuProcess {
    /// Create a new GPU process row
    pub fn new(pid: u32, used_memory: ByteSize, process_type: ProcessType) -> Self {
        Self {
            pid,
            used_memory,
            process_type,
        }
    }

    /// Shorthand for a compute context row
    pub fn compute(pid: u32, used_memory: ByteSize) -> Self {
        Self::new(pid, used_memory, ProcessType::Compute)
    }

    /// Shorthand for a graphics context row
    pub fn graphics(pid: u32, used_memory: ByteSize) -> Self {
        Self::new(pid, used_memory, ProcessType::Graphics)
    }
}

impl fmt::Display for GpuProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PID {} ({}): {}",
            self.pid, self.process_type, self.used_memory
        )
    }
}

/// Type of GPU context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessType {
    /// Graphics rendering context
    Graphics,
    /// Compute/CUDA context
    Compute,
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graphics => write!(f, "Graphics"),
            Self::Compute => write!(f, "Compute"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_process_creation() {
        let process = GpuProcess::compute(1234, ByteSize::from_mib(512));
        assert_eq!(process.pid, 1234);
        assert_eq!(process.used_memory.as_bytes(), 512 * 1024 * 1024);
        assert_eq!(process.process_type, ProcessType::Compute);
    }

    #[test]
    fn test_gpu_process_display() {
        let process = GpuProcess::graphics(42, ByteSize::from_mib(2));
        assert_eq!(process.to_string(), "PID 42 (Graphics): 2.00MB");
    }
}
