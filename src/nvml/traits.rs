//! Trait definitions for GPU telemetry
//!
//! These traits abstract over NVML to enable testing with mocks.

use crate::domain::GpuProcess;
use crate::error::NvmlError;

/// Per-device telemetry
///
/// Production code uses the NVML-backed implementation; tests swap in
/// in-memory devices.
pub trait GpuDevice: Send + Sync {
    /// Get the GPU index
    fn index(&self) -> u32;

    /// Get the GPU name
    fn name(&self) -> Result<String, NvmlError>;

    /// Processes holding a compute context on this GPU
    fn compute_processes(&self) -> Result<Vec<GpuProcess>, NvmlError>;

    /// Processes holding a graphics context on this GPU
    fn graphics_processes(&self) -> Result<Vec<GpuProcess>, NvmlError>;
}

/// Trait for discovering GPUs within one telemetry session
///
/// Devices borrow the manager, so no handle can outlive the session that
/// produced it.
pub trait GpuManager: Send + Sync {
    /// The device type returned by this manager
    type Device<'a>: GpuDevice
    where
        Self: 'a;

    /// Get the number of GPU devices
    fn device_count(&self) -> Result<u32, NvmlError>;

    /// Get a device by index
    fn device_by_index(&self, index: u32) -> Result<Self::Device<'_>, NvmlError>;

    /// Get all devices, in index order
    fn all_devices(&self) -> Result<Vec<Self::Device<'_>>, NvmlError> {
        let count = self.device_count()?;
        let mut devices = Vec::with_capacity(count as usize);
        for i in 0..count {
            devices.push(self.device_by_index(i)?);
        }
        Ok(devices)
    }

    /// Get driver version
    fn driver_version(&self) -> Result<String, NvmlError>;
}

impl<D: GpuDevice + ?Sized> GpuDevice for &D {
    fn index(&self) -> u32 {
        (**self).index()
    }

    fn name(&self) -> Result<String, NvmlError> {
        (**self).name()
    }

    fn compute_processes(&self) -> Result<Vec<GpuProcess>, NvmlError> {
        (**self).compute_processes()
    }

    fn graphics_processes(&self) -> Result<Vec<GpuProcess>, NvmlError> {
        (**self).graphics_processes()
    }
}
