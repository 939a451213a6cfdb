//! Signal passthrough
//!
//! Every signal the supervisor receives is handed to the child unchanged,
//! except SIGCHLD, which the runtime needs to learn that the child exited.

use crate::services::cancel::CancelToken;
use crate::services::child::ChildHandle;

use nix::sys::signal::Signal;
use std::future::poll_fn;
use std::task::Poll;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

/// Signals that are never relayed
///
/// SIGCHLD drives child reaping, SIGKILL and SIGSTOP cannot be caught, and
/// the rest are synchronous faults of the supervisor itself.
pub const NOT_FORWARDED: [Signal; 9] = [
    Signal::SIGCHLD,
    Signal::SIGKILL,
    Signal::SIGSTOP,
    Signal::SIGSEGV,
    Signal::SIGBUS,
    Signal::SIGILL,
    Signal::SIGFPE,
    Signal::SIGTRAP,
    Signal::SIGSYS,
];

/// Every signal number of this platform that can be relayed
pub fn default_forward_set() -> Vec<i32> {
    #[allow(unused_mut)]
    let mut set: Vec<i32> = Signal::iterator()
        .filter(|s| !NOT_FORWARDED.contains(s))
        .map(|s| s as i32)
        .collect();

    #[cfg(target_os = "linux")]
    set.extend(libc::SIGRTMIN()..=libc::SIGRTMAX());

    set
}

/// Installed signal listeners, waiting to be bound to a child
pub struct SignalRelay {
    listeners: Vec<(i32, tokio::signal::unix::Signal)>,
}

impl SignalRelay {
    /// Install listeners for the given signal numbers
    ///
    /// Must run inside a tokio runtime. Once installed, the signals no longer
    /// take their default action on the supervisor; anything received before
    /// [`SignalRelay::spawn`] is delivered to the child once it runs. Signals
    /// the runtime refuses to handle are left out.
    pub fn listen(signals: &[i32]) -> Self {
        let mut listeners = Vec::with_capacity(signals.len());
        for &signo in signals {
            match signal(SignalKind::from_raw(signo)) {
                Ok(listener) => listeners.push((signo, listener)),
                Err(e) => log::debug!("Not relaying signal {}: {}", signo, e),
            }
        }
        log::debug!("Relaying {} signal(s)", listeners.len());
        Self { listeners }
    }

    /// Signal numbers this relay listens for
    pub fn signals(&self) -> Vec<i32> {
        self.listeners.iter().map(|(signo, _)| *signo).collect()
    }

    /// Forward signals to `child` until `cancel` fires
    ///
    /// The task resolves to the number of signals delivered.
    pub fn spawn(self, child: ChildHandle, cancel: CancelToken) -> JoinHandle<usize> {
        tokio::spawn(self.run(child, cancel))
    }

    async fn run(mut self, child: ChildHandle, mut cancel: CancelToken) -> usize {
        let mut forwarded = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                signo = self.recv() => {
                    if child.forward(signo) {
                        log::debug!("Forwarded signal {} to PID {}", signo, child.pid());
                        forwarded += 1;
                    }
                }
            }
        }
        forwarded
    }

    async fn recv(&mut self) -> i32 {
        poll_fn(|cx| {
            for (signo, listener) in self.listeners.iter_mut() {
                if let Poll::Ready(Some(())) = listener.poll_recv(cx) {
                    return Poll::Ready(*signo);
                }
            }
            Poll::Pending
        })
        .await
    }
}
