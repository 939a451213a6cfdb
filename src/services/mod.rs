//! Supervision services
//!
//! The concurrent core: usage sampling, child lifecycle, signal relay and the
//! loop that coordinates them.

pub mod cancel;
pub mod child;
pub mod relay;
pub mod sampler;
pub mod supervisor;

pub use cancel::{CancelScope, CancelToken};
pub use child::{ChildExit, ChildHandle, ChildProcess};
pub use relay::{default_forward_set, SignalRelay};
pub use sampler::{sample_usage, BreachPolicy, MonitorStats, UsageMonitor};
pub use supervisor::{Outcome, Supervisor, SupervisorConfig};
