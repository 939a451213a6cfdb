//! Supervision loop
//!
//! Starts the child, then races "child exited" against "usage monitor gave
//! up" while the signal relay runs alongside. Whichever is observed first
//! decides the outcome; the child's real exit status is always collected
//! before returning.
//!
//! The usage monitor borrows the devices, so it runs inside the supervising
//! future instead of a spawned task. NVML queries are synchronous: a slow
//! query delays noticing the child's exit by that query's duration, never
//! loses it. Reaping and signal relaying run on their own tasks and are not
//! held up.

use crate::domain::{ByteSize, TermSignal};
use crate::error::SupervisionError;
use crate::nvml::GpuDevice;
use crate::services::cancel::CancelScope;
use crate::services::child::{ChildExit, ChildProcess};
use crate::services::relay::{default_forward_set, SignalRelay};
use crate::services::sampler::{BreachPolicy, MonitorStats, UsageMonitor, DEFAULT_INTERVAL};

use std::time::Duration;
use tokio::sync::oneshot;

/// Settings for one supervised run
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// GPU memory ceiling
    pub limit: ByteSize,
    /// Signal sent to the child once the ceiling is exceeded
    pub signal: TermSignal,
    /// Interval between two usage samples
    pub interval: Duration,
    /// Reaction to breaches and sampling errors
    pub policy: BreachPolicy,
    /// Signal numbers relayed to the child
    pub relay_signals: Vec<i32>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            limit: ByteSize::from_mib(1),
            signal: TermSignal::default(),
            interval: DEFAULT_INTERVAL,
            policy: BreachPolicy::default(),
            relay_signals: default_forward_set(),
        }
    }
}

/// Result of a supervised run
#[derive(Debug)]
pub struct Outcome {
    /// How the child ended
    pub exit: ChildExit,
    /// Why supervision ended early, if it did
    pub error: Option<SupervisionError>,
    /// Usage counters
    pub stats: MonitorStats,
    /// Signals relayed to the child
    pub forwarded: usize,
    /// Time from start to reap
    pub elapsed: Duration,
}

impl Outcome {
    /// Exit code the supervisor should exit with
    pub fn exit_code(&self) -> i32 {
        self.exit.code()
    }
}

enum End {
    Exited(Result<Result<ChildExit, SupervisionError>, oneshot::error::RecvError>),
    Abnormal(SupervisionError),
}

/// Runs one child under a GPU memory ceiling
pub struct Supervisor<'a, D> {
    config: SupervisorConfig,
    devices: &'a [D],
}

impl<'a, D: GpuDevice> Supervisor<'a, D> {
    /// Create a supervisor sampling the given devices
    pub fn new(config: SupervisorConfig, devices: &'a [D]) -> Self {
        Self { config, devices }
    }

    /// Start `argv` and supervise it until it has exited
    ///
    /// Signal listeners go up before the child is created, so nothing sent to
    /// the supervisor in between is lost or takes its default action.
    pub async fn run(&self, argv: &[String]) -> Result<Outcome, SupervisionError> {
        let relay = SignalRelay::listen(&self.config.relay_signals);
        let child = ChildProcess::spawn(argv)?;
        log::info!(
            "Started PID {} (limit {}, signal {}, {} GPU(s))",
            child.pid(),
            self.config.limit,
            self.config.signal,
            self.devices.len()
        );
        self.supervise(child, relay).await
    }

    /// Supervise an already started child
    ///
    /// Returns `Err` only when the exit status could not be collected. A
    /// breach or sampling failure is reported in [`Outcome::error`] next to
    /// the exit status the child actually ended with.
    pub async fn supervise(
        &self,
        child: ChildProcess,
        relay: SignalRelay,
    ) -> Result<Outcome, SupervisionError> {
        let handle = child.handle();
        let pid = handle.pid();
        let scope = CancelScope::new();

        let relay_task = relay.spawn(handle.clone(), scope.token());

        let (exit_tx, mut exit_rx) = oneshot::channel();
        let waiter = tokio::spawn(async move {
            let _ = exit_tx.send(child.wait().await);
        });

        let mut monitor = UsageMonitor::new(self.devices, pid, self.config.limit)
            .with_interval(self.config.interval)
            .with_policy(self.config.policy);

        let end = {
            let monitoring = monitor.run(scope.token());
            tokio::pin!(monitoring);
            tokio::select! {
                exited = &mut exit_rx => End::Exited(exited),
                Some(err) = &mut monitoring => End::Abnormal(err),
            }
        };

        let (exited, error) = match end {
            End::Exited(exited) => (exited, None),
            End::Abnormal(err) => {
                log::warn!("Terminating PID {}: {}", pid, err);
                handle.terminate(self.config.signal);
                ((&mut exit_rx).await, Some(err))
            }
        };

        scope.cancel();
        let forwarded = relay_task.await.unwrap_or_else(|e| {
            log::warn!("Signal relay task failed: {}", e);
            0
        });
        if let Err(e) = waiter.await {
            log::warn!("Wait task failed: {}", e);
        }

        let exit = exited.map_err(|_| SupervisionError::WaiterLost(pid))??;
        let stats = monitor.stats();
        let elapsed = handle.started_at().elapsed();

        log::info!(
            "PID {} {} after {:.1?} (GPU memory last {}, peak {}, {} sample(s), {} signal(s) forwarded)",
            pid,
            exit,
            elapsed,
            stats.last,
            stats.peak,
            stats.samples,
            forwarded
        );

        Ok(Outcome {
            exit,
            error,
            stats,
            forwarded,
            elapsed,
        })
    }
}
