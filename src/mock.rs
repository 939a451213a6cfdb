//! Mock implementations for testing
//!
//! Provides mock GPU device and manager for unit testing without real hardware.

use crate::domain::{ByteSize, GpuProcess};
use crate::error::NvmlError;
use crate::nvml::{GpuDevice, GpuManager};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Mock GPU device for testing
#[derive(Debug)]
pub struct MockDevice {
    index: u32,
    name: String,
    compute: RwLock<Vec<GpuProcess>>,
    graphics: RwLock<Vec<GpuProcess>>,
    failure: RwLock<Option<NvmlError>>,
    queries: AtomicUsize,
}

impl MockDevice {
    /// Create a new mock device with no running processes
    pub fn new(index: u32) -> Self {
        Self {
            index,
            name: format!("Mock GPU {}", index),
            compute: RwLock::new(Vec::new()),
            graphics: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
            queries: AtomicUsize::new(0),
        }
    }

    /// Builder: add a compute context
    pub fn with_compute(self, pid: u32, used: ByteSize) -> Self {
        self.compute.write().unwrap().push(GpuProcess::compute(pid, used));
        self
    }

    /// Builder: add a graphics context
    pub fn with_graphics(self, pid: u32, used: ByteSize) -> Self {
        self.graphics.write().unwrap().push(GpuProcess::graphics(pid, used));
        self
    }

    /// Builder: make every query fail
    pub fn with_failure(self, err: NvmlError) -> Self {
        self.fail_with(err);
        self
    }

    /// Replace the compute context list
    pub fn set_compute(&self, processes: Vec<GpuProcess>) {
        *self.compute.write().unwrap() = processes;
    }

    /// Replace the graphics context list
    pub fn set_graphics(&self, processes: Vec<GpuProcess>) {
        *self.graphics.write().unwrap() = processes;
    }

    /// Make subsequent queries fail
    pub fn fail_with(&self, err: NvmlError) {
        *self.failure.write().unwrap() = Some(err);
    }

    /// Number of process-list queries served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn query(&self, list: &RwLock<Vec<GpuProcess>>) -> Result<Vec<GpuProcess>, NvmlError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.read().unwrap().clone() {
            return Err(err);
        }
        Ok(list.read().unwrap().clone())
    }
}

impl GpuDevice for MockDevice {
    fn index(&self) -> u32 {
        self.index
    }

    fn name(&self) -> Result<String, NvmlError> {
        Ok(self.name.clone())
    }

    fn compute_processes(&self) -> Result<Vec<GpuProcess>, NvmlError> {
        self.query(&self.compute)
    }

    fn graphics_processes(&self) -> Result<Vec<GpuProcess>, NvmlError> {
        self.query(&self.graphics)
    }
}

/// Mock GPU manager for testing
pub struct MockManager {
    devices: Vec<MockDevice>,
    enumeration_failure: Option<NvmlError>,
}

impl MockManager {
    /// Create a new mock manager with the specified devices
    pub fn new(devices: Vec<MockDevice>) -> Self {
        Self {
            devices,
            enumeration_failure: None,
        }
    }

    /// Create a mock manager with N idle devices
    pub fn with_device_count(count: u32) -> Self {
        Self::new((0..count).map(MockDevice::new).collect())
    }

    /// Builder: make device enumeration fail
    pub fn with_enumeration_failure(mut self, err: NvmlError) -> Self {
        self.enumeration_failure = Some(err);
        self
    }

    /// Access a device for adjusting its telemetry mid-test
    pub fn device(&self, index: usize) -> &MockDevice {
        &self.devices[index]
    }
}

impl GpuManager for MockManager {
    type Device<'a> = &'a MockDevice;

    fn device_count(&self) -> Result<u32, NvmlError> {
        if let Some(err) = &self.enumeration_failure {
            return Err(err.clone());
        }
        Ok(self.devices.len() as u32)
    }

    fn device_by_index(&self, index: u32) -> Result<Self::Device<'_>, NvmlError> {
        self.devices
            .get(index as usize)
            .ok_or(NvmlError::DeviceNotFound(index))
    }

    fn driver_version(&self) -> Result<String, NvmlError> {
        if let Some(err) = &self.enumeration_failure {
            return Err(err.clone());
        }
        Ok("mock".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_device_lists() {
        let device = MockDevice::new(0)
            .with_compute(10, ByteSize::from_mib(1))
            .with_graphics(11, ByteSize::from_mib(2));
        assert_eq!(device.compute_processes().unwrap().len(), 1);
        assert_eq!(device.graphics_processes().unwrap()[0].pid, 11);
        assert_eq!(device.query_count(), 2);
    }

    #[test]
    fn test_mock_manager_enumeration() {
        let manager = MockManager::with_device_count(3);
        let devices = manager.all_devices().unwrap();
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[2].index(), 2);
        assert!(manager.device_by_index(5).is_err());

        let failing = MockManager::with_device_count(1).with_enumeration_failure(NvmlError::GpuLost);
        assert!(failing.all_devices().is_err());
    }

    #[test]
    fn test_mock_manager_driver_version() {
        let manager = MockManager::with_device_count(1);
        assert_eq!(manager.driver_version().unwrap(), "mock");

        let failing = MockManager::with_device_count(1).with_enumeration_failure(NvmlError::GpuLost);
        assert_eq!(failing.driver_version(), Err(NvmlError::GpuLost));
    }
}
