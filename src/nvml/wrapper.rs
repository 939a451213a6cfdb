//! NVML manager implementation
//!
//! Owns the NVML session: initialised once, devices enumerated from it, and
//! shut down once after supervision has finished.

use crate::error::NvmlError;
use crate::nvml::device::NvmlDevice;
use crate::nvml::traits::GpuManager;

use nvml_wrapper::Nvml;

/// NVML manager for GPU discovery
pub struct NvmlManager {
    nvml: Nvml,
}

impl NvmlManager {
    /// Initialize NVML and create a new manager
    pub fn new() -> Result<Self, NvmlError> {
        let nvml = Nvml::init().map_err(|e| match e {
            nvml_wrapper::error::NvmlError::LibloadingError(_) => NvmlError::LibraryNotFound,
            nvml_wrapper::error::NvmlError::DriverNotLoaded => {
                NvmlError::InitializationFailed("NVIDIA driver not loaded".to_string())
            }
            other => NvmlError::InitializationFailed(other.to_string()),
        })?;

        Ok(Self { nvml })
    }

    /// Close the NVML session
    pub fn shutdown(self) -> Result<(), NvmlError> {
        self.nvml
            .shutdown()
            .map_err(|e| NvmlError::ShutdownFailed(e.to_string()))
    }
}

impl GpuManager for NvmlManager {
    type Device<'a> = NvmlDevice<'a>;

    fn device_count(&self) -> Result<u32, NvmlError> {
        self.nvml
            .device_count()
            .map_err(|e| NvmlError::Unknown(format!("unable to get device count: {}", e)))
    }

    fn device_by_index(&self, index: u32) -> Result<Self::Device<'_>, NvmlError> {
        let device = self.nvml.device_by_index(index).map_err(|e| match e {
            nvml_wrapper::error::NvmlError::NotFound => NvmlError::DeviceNotFound(index),
            other => NvmlDevice::convert_error(other),
        })?;

        Ok(NvmlDevice::new(device, index))
    }

    fn driver_version(&self) -> Result<String, NvmlError> {
        self.nvml
            .sys_driver_version()
            .map_err(|e| NvmlError::Unknown(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nvml::GpuDevice;

    // Note: These tests require actual NVIDIA hardware and drivers

    #[test]
    #[ignore = "Requires NVIDIA GPU"]
    fn test_nvml_init_and_shutdown() {
        let manager = NvmlManager::new().unwrap();
        assert!(manager.shutdown().is_ok());
    }

    #[test]
    #[ignore = "Requires NVIDIA GPU"]
    fn test_enumerate_and_query() {
        let manager = NvmlManager::new().unwrap();
        let devices = manager.all_devices().unwrap();
        assert!(!devices.is_empty());
        for device in &devices {
            assert!(device.compute_processes().is_ok());
            assert!(device.graphics_processes().is_ok());
        }
        drop(devices);
        manager.shutdown().unwrap();
    }
}
