//! GPU memory sampling
//!
//! Aggregates per-device telemetry into the total memory a single PID holds,
//! and runs that aggregation on a fixed interval against the ceiling.

use crate::domain::{ByteSize, GpuProcess};
use crate::error::{NvmlError, SupervisionError};
use crate::nvml::GpuDevice;
use crate::services::cancel::CancelToken;

use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Default interval between two samples
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// What to do when a sample goes over the ceiling or cannot be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreachPolicy {
    /// End supervision so the child gets terminated
    #[default]
    Terminate,
    /// Log a warning and keep supervising (dry run)
    Warn,
}

/// Memory `pid` holds on one device, compute and graphics contexts combined
pub fn device_usage<D: GpuDevice>(device: &D, pid: u32) -> Result<ByteSize, NvmlError> {
    let compute = device.compute_processes()?;
    let graphics = device.graphics_processes()?;
    Ok(sum_for_pid(pid, compute.iter().chain(graphics.iter())))
}

/// Memory `pid` holds across all devices
///
/// Any failing query fails the whole sample; no partial total is returned.
pub fn sample_usage<D: GpuDevice>(pid: u32, devices: &[D]) -> Result<ByteSize, NvmlError> {
    devices.iter().try_fold(ByteSize::ZERO, |total, device| {
        let usage = device_usage(device, pid).inspect_err(|e| {
            log::debug!("GPU {} query failed: {}", device.index(), e);
        })?;
        Ok(total.saturating_add(usage))
    })
}

fn sum_for_pid<'a>(pid: u32, processes: impl Iterator<Item = &'a GpuProcess>) -> ByteSize {
    processes
        .filter(|p| p.pid == pid)
        .fold(ByteSize::ZERO, |total, p| total.saturating_add(p.used_memory))
}

/// Counters kept across one monitoring run, for reporting only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Samples taken successfully
    pub samples: u64,
    /// Most recent successful sample
    pub last: ByteSize,
    /// Highest sample seen
    pub peak: ByteSize,
}

/// Periodic usage check for one child
pub struct UsageMonitor<'a, D> {
    devices: &'a [D],
    pid: u32,
    limit: ByteSize,
    interval: Duration,
    policy: BreachPolicy,
    stats: MonitorStats,
}

impl<'a, D: GpuDevice> UsageMonitor<'a, D> {
    /// Create a monitor for `pid` over the given devices
    pub fn new(devices: &'a [D], pid: u32, limit: ByteSize) -> Self {
        Self {
            devices,
            pid,
            limit,
            interval: DEFAULT_INTERVAL,
            policy: BreachPolicy::default(),
            stats: MonitorStats::default(),
        }
    }

    /// Builder: set the sampling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Builder: set the breach policy
    pub fn with_policy(mut self, policy: BreachPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Counters collected so far
    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Take one sample and compare it against the ceiling
    pub fn check(&mut self) -> Result<ByteSize, SupervisionError> {
        let usage = sample_usage(self.pid, self.devices)?;

        self.stats.samples += 1;
        self.stats.last = usage;
        self.stats.peak = self.stats.peak.max(usage);
        log::debug!("PID {} GPU memory usage: {}", self.pid, usage);

        if usage > self.limit {
            return Err(SupervisionError::LimitExceeded {
                usage,
                limit: self.limit,
            });
        }
        Ok(usage)
    }

    /// Sample every interval until the ceiling is breached or a query fails
    ///
    /// Returns the error that ended monitoring, or `None` once `cancel`
    /// fires. Under [`BreachPolicy::Warn`] only cancellation ends the loop.
    pub async fn run(&mut self, mut cancel: CancelToken) -> Option<SupervisionError> {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut warned = false;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = ticker.tick() => {}
            }

            match self.check() {
                Ok(_) => warned = false,
                Err(err) if self.policy == BreachPolicy::Terminate => return Some(err),
                Err(err) => {
                    if !warned {
                        log::warn!("{} (dry run, not terminating)", err);
                        warned = true;
                    }
                }
            }
        }
    }
}
