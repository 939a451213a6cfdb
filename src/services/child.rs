//! Child process lifecycle
//!
//! Starts the supervised command, delivers signals to it and collects its
//! exit status. The exit status is collected by consuming [`ChildProcess`],
//! so a child can only ever be reaped once.

use crate::domain::TermSignal;
use crate::error::SupervisionError;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::process::{Child, Command};

/// Shell convention for processes killed by a signal
const SIGNAL_EXIT_BASE: i32 = 128;

#[derive(Debug)]
struct ChildState {
    pid: Pid,
    started_at: Instant,
    reaped: AtomicBool,
}

/// Shared descriptor of a running child
///
/// Cloned into every task that needs to reach the child. Signal delivery
/// through the handle stops once the child has been reaped.
#[derive(Debug, Clone)]
pub struct ChildHandle(Arc<ChildState>);

impl ChildHandle {
    /// Process ID of the child
    pub fn pid(&self) -> u32 {
        self.0.pid.as_raw() as u32
    }

    /// When the child was started
    pub fn started_at(&self) -> Instant {
        self.0.started_at
    }

    /// Whether the exit status has been collected
    pub fn is_reaped(&self) -> bool {
        self.0.reaped.load(Ordering::SeqCst)
    }

    /// Ask the child to terminate
    ///
    /// Best effort: failures are logged and otherwise ignored, waiting on the
    /// child is what determines the outcome.
    pub fn terminate(&self, signal: TermSignal) -> bool {
        match self.send(signal.as_raw()) {
            Ok(()) => {
                log::info!("Sent {} to PID {}", signal, self.pid());
                true
            }
            Err(e) => {
                log::warn!("Failed to send {} to PID {}: {}", signal, self.pid(), e);
                false
            }
        }
    }

    /// Relay a raw signal number to the child
    pub fn forward(&self, signo: i32) -> bool {
        match self.send(signo) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Dropped signal {} for PID {}: {}", signo, self.pid(), e);
                false
            }
        }
    }

    fn send(&self, signo: i32) -> nix::Result<()> {
        if self.is_reaped() {
            return Err(Errno::ESRCH);
        }
        match Signal::try_from(signo) {
            Ok(signal) => kill(self.0.pid, signal),
            Err(_) => {
                // Real-time signals have no `Signal` variant.
                // SAFETY: kill(2) has no memory-safety preconditions.
                let rc = unsafe { libc::kill(self.0.pid.as_raw(), signo) };
                Errno::result(rc).map(drop)
            }
        }
    }
}

/// How the child ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    status: ExitStatus,
}

impl ChildExit {
    /// Exit code to propagate: the child's own code, or 128 + signal number
    pub fn code(&self) -> i32 {
        match (self.status.code(), self.status.signal()) {
            (Some(code), _) => code,
            (None, Some(signo)) => SIGNAL_EXIT_BASE + signo,
            (None, None) => 1,
        }
    }

    /// Signal that terminated the child, if any
    pub fn signal(&self) -> Option<i32> {
        self.status.signal()
    }

    /// Whether the child exited on its own with status zero
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

impl From<ExitStatus> for ChildExit {
    fn from(status: ExitStatus) -> Self {
        Self { status }
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.signal() {
            Some(signo) => match Signal::try_from(signo) {
                Ok(signal) => write!(f, "killed by {}", signal),
                Err(_) => write!(f, "killed by signal {}", signo),
            },
            None => write!(f, "exited with code {}", self.code()),
        }
    }
}

/// Owner of the child process
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    handle: ChildHandle,
}

impl ChildProcess {
    /// Start `argv[0]` with the remaining arguments
    ///
    /// The executable is looked up on `PATH`. Environment, working directory
    /// and the standard streams are inherited unchanged.
    pub fn spawn(argv: &[String]) -> Result<Self, SupervisionError> {
        let (program, args) = argv.split_first().ok_or(SupervisionError::EmptyCommand)?;
        let spawn_error = |source| SupervisionError::Spawn {
            command: program.clone(),
            source,
        };

        let child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(spawn_error)?;
        let pid = child.id().ok_or_else(|| {
            spawn_error(std::io::Error::other("process exited before its PID was read"))
        })?;

        log::debug!("Started {:?} as PID {}", argv, pid);

        let handle = ChildHandle(Arc::new(ChildState {
            pid: Pid::from_raw(pid as i32),
            started_at: Instant::now(),
            reaped: AtomicBool::new(false),
        }));
        Ok(Self { child, handle })
    }

    /// Process ID of the child
    pub fn pid(&self) -> u32 {
        self.handle.pid()
    }

    /// Descriptor to share with other tasks
    pub fn handle(&self) -> ChildHandle {
        self.handle.clone()
    }

    /// Block until the child terminates and collect its exit status
    pub async fn wait(mut self) -> Result<ChildExit, SupervisionError> {
        let pid = self.pid();
        let status = self
            .child
            .wait()
            .await
            .map_err(|source| SupervisionError::Wait { pid, source })?;
        self.handle.0.reaped.store(true, Ordering::SeqCst);

        let exit = ChildExit::from(status);
        log::debug!("PID {} {}", pid, exit);
        Ok(exit)
    }
}

#[cfg(test)]
pub(crate) fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
