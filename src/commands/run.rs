//! Run command implementation
//!
//! Picks the devices to sample, builds the runtime and supervises the child.

use crate::config::Config;
use crate::error::{AppError, Result, SupervisionError};
use crate::nvml::{GpuDevice, GpuManager};
use crate::services::Supervisor;

/// Run `command` under the configured ceiling
///
/// Returns the exit code the supervisor should exit with. Errors are fatal
/// problems that happened before the child could be reaped; a breach is
/// logged and still yields the child's exit code.
pub fn run_supervised<M: GpuManager>(
    manager: &M,
    config: &Config,
    command: &[String],
) -> Result<i32> {
    match manager.driver_version() {
        Ok(version) => log::debug!("NVIDIA driver {}", version),
        Err(e) => log::debug!("Driver version unavailable: {}", e),
    }

    let devices = select_devices(manager, &config.gpu.indices)?;
    if devices.is_empty() {
        log::warn!("No GPUs to sample; the memory limit cannot be enforced");
    }
    for device in &devices {
        match device.name() {
            Ok(name) => log::debug!("Sampling GPU {}: {}", device.index(), name),
            Err(e) => log::debug!("Sampling GPU {} (name unavailable: {})", device.index(), e),
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SupervisionError::Runtime)?;

    let supervisor = Supervisor::new(config.supervisor_config(), &devices);
    let outcome = runtime.block_on(supervisor.run(command))?;

    if let Some(err) = &outcome.error {
        log::error!("{}", err);
    }
    Ok(outcome.exit_code())
}

/// Devices at the given indices, or every device when none are given
pub fn select_devices<'m, M: GpuManager>(
    manager: &'m M,
    indices: &[u32],
) -> Result<Vec<M::Device<'m>>> {
    if indices.is_empty() {
        return Ok(manager.all_devices()?);
    }

    let count = manager.device_count()?;
    indices
        .iter()
        .map(|&index| {
            if index >= count {
                return Err(AppError::GpuNotFound { index, count });
            }
            Ok(manager.device_by_index(index)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NvmlError;
    use crate::mock::MockManager;
    use crate::services::child::argv;
    use serial_test::serial;

    #[test]
    fn test_select_all_devices() {
        let manager = MockManager::with_device_count(2);
        let devices = select_devices(&manager, &[]).unwrap();
        assert_eq!(devices.len(), 2);
    }

    #[test]
    fn test_select_some_devices() {
        let manager = MockManager::with_device_count(3);
        let devices = select_devices(&manager, &[2, 0]).unwrap();
        let indices: Vec<u32> = devices.iter().map(|d| d.index()).collect();
        assert_eq!(indices, vec![2, 0]);
    }

    #[test]
    fn test_select_unknown_device() {
        let manager = MockManager::with_device_count(1);
        let err = select_devices(&manager, &[4]).unwrap_err();
        assert!(matches!(err, AppError::GpuNotFound { index: 4, count: 1 }));
    }

    #[test]
    fn test_enumeration_failure_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("started");
        let manager = MockManager::with_device_count(1)
            .with_enumeration_failure(NvmlError::Unknown("unable to get device count".into()));

        let command = argv(&["touch", marker.to_str().unwrap()]);
        let err = run_supervised(&manager, &Config::default(), &command).unwrap_err();

        assert!(matches!(err, AppError::Nvml(_)));
        assert!(!marker.exists());
    }

    #[test]
    #[serial(signals)]
    fn test_exit_code_is_propagated() {
        let manager = MockManager::with_device_count(1);
        let command = argv(&["sh", "-c", "exit 4"]);
        let code = run_supervised(&manager, &Config::default(), &command).unwrap();
        assert_eq!(code, 4);
    }

    #[test]
    #[serial(signals)]
    fn test_sampling_error_still_returns_exit_code() {
        let manager = MockManager::with_device_count(1);
        manager
            .device(0)
            .fail_with(NvmlError::Unknown("query failed".into()));

        let code = run_supervised(&manager, &Config::default(), &argv(&["sleep", "10"])).unwrap();
        assert_eq!(code, 128 + nix::sys::signal::Signal::SIGKILL as i32);
    }
}
