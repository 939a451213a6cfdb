//! Termination signal domain type

use crate::error::DomainError;
use nix::sys::signal::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Signal sent to the child when it goes over its memory ceiling
///
/// Parses `SIGTERM`, `TERM` (any case) or a plain signal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TermSignal(Signal);

impl TermSignal {
    /// Wrap a platform signal
    pub const fn new(signal: Signal) -> Self {
        Self(signal)
    }

    /// Get the platform signal
    #[inline]
    pub const fn signal(&self) -> Signal {
        self.0
    }

    /// Get the raw signal number
    #[inline]
    pub fn as_raw(&self) -> i32 {
        self.0 as i32
    }
}

impl Default for TermSignal {
    fn default() -> Self {
        Self(Signal::SIGKILL)
    }
}

impl FromStr for TermSignal {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let unknown = || DomainError::UnknownSignal(s.to_string());

        if let Ok(signo) = name.parse::<i32>() {
            return Signal::try_from(signo).map(Self).map_err(|_| unknown());
        }

        let upper = name.to_ascii_uppercase();
        let full = if upper.starts_with("SIG") {
            upper
        } else {
            format!("SIG{upper}")
        };
        Signal::from_str(&full).map(Self).map_err(|_| unknown())
    }
}

impl TryFrom<String> for TermSignal {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TermSignal> for String {
    fn from(signal: TermSignal) -> Self {
        signal.to_string()
    }
}

impl fmt::Display for TermSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
