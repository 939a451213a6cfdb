//! NVML device implementation
//!
//! Real implementation of GpuDevice trait using nvml-wrapper.

use crate::domain::{ByteSize, GpuProcess, ProcessType};
use crate::error::NvmlError;
use crate::nvml::traits::GpuDevice;

use nvml_wrapper::enums::device::UsedGpuMemory;
use nvml_wrapper::struct_wrappers::device::ProcessInfo;
use nvml_wrapper::Device;

/// NVML device wrapper implementing GpuDevice trait
pub struct NvmlDevice<'a> {
    device: Device<'a>,
    index: u32,
}

impl<'a> NvmlDevice<'a> {
    /// Create a new NVML device wrapper
    pub fn new(device: Device<'a>, index: u32) -> Self {
        Self { device, index }
    }

    /// Convert NVML error to our error type
    pub(crate) fn convert_error(err: nvml_wrapper::error::NvmlError) -> NvmlError {
        use nvml_wrapper::error::NvmlError as NE;
        match err {
            NE::NotSupported => {
                NvmlError::NotSupported("Operation not supported by this GPU".to_string())
            }
            NE::NoPermission => {
                NvmlError::InsufficientPermissions("Insufficient permissions".to_string())
            }
            NE::GpuLost => NvmlError::GpuLost,
            _ => NvmlError::Unknown(err.to_string()),
        }
    }

    fn to_process(info: ProcessInfo, process_type: ProcessType) -> GpuProcess {
        // The driver cannot attribute memory under some virtualization setups.
        let used = match info.used_gpu_memory {
            UsedGpuMemory::Used(bytes) => bytes,
            UsedGpuMemory::Unavailable => 0,
        };
        GpuProcess::new(info.pid, ByteSize::from_bytes(used), process_type)
    }
}

impl GpuDevice for NvmlDevice<'_> {
    fn index(&self) -> u32 {
        self.index
    }

    fn name(&self) -> Result<String, NvmlError> {
        self.device.name().map_err(Self::convert_error)
    }

    fn compute_processes(&self) -> Result<Vec<GpuProcess>, NvmlError> {
        let processes = self
            .device
            .running_compute_processes()
            .map_err(Self::convert_error)?;
        Ok(processes
            .into_iter()
            .map(|p| Self::to_process(p, ProcessType::Compute))
            .collect())
    }

    fn graphics_processes(&self) -> Result<Vec<GpuProcess>, NvmlError> {
        let processes = self
            .device
            .running_graphics_processes()
            .map_err(Self::convert_error)?;
        Ok(processes
            .into_iter()
            .map(|p| Self::to_process(p, ProcessType::Graphics))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_error() {
        use nvml_wrapper::error::NvmlError as NE;
        assert_eq!(NvmlDevice::convert_error(NE::GpuLost), NvmlError::GpuLost);
        assert!(matches!(
            NvmlDevice::convert_error(NE::NoPermission),
            NvmlError::InsufficientPermissions(_)
        ));
        assert!(matches!(
            NvmlDevice::convert_error(NE::Unknown),
            NvmlError::Unknown(_)
        ));
    }
}
