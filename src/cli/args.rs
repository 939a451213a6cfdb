//! CLI argument definitions using clap derive

use crate::domain::{ByteSize, TermSignal};
use clap::Parser;
use std::path::PathBuf;

/// Run a command under a GPU memory ceiling
///
/// Samples the GPU memory held by COMMAND through NVML and sends it SIGNAL
/// once the total exceeds SIZE. Signals received by gml are passed on to
/// COMMAND, and COMMAND's exit status becomes gml's exit status.
#[derive(Parser, Debug)]
#[command(name = "gml")]
#[command(author, version)]
#[command(override_usage = "gml [OPTIONS] -- COMMAND [ARGS]...")]
pub struct Cli {
    /// Total GPU memory limit for the command, e.g. 512KB, 2GB [default: 1MB]
    #[arg(short, long, value_name = "SIZE")]
    pub limit: Option<ByteSize>,

    /// Signal sent to the command when it exceeds the limit [default: SIGKILL]
    #[arg(short, long, value_name = "SIGNAL")]
    pub signal: Option<TermSignal>,

    /// Interval between two memory samples in milliseconds [default: 100]
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Only sample this GPU (repeatable; default: all GPUs)
    #[arg(long = "gpu", value_name = "INDEX")]
    pub gpus: Vec<u32>,

    /// Log limit breaches without signalling the command
    #[arg(long)]
    pub dry_run: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to run, given after `--`
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use nix::sys::signal::Signal;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full() {
        let cli = Cli::try_parse_from([
            "gml", "-l", "2GB", "--signal", "SIGTERM", "--gpu", "0", "--gpu", "1", "--", "python",
            "train.py", "--epochs", "3",
        ])
        .unwrap();

        assert_eq!(cli.limit, Some(ByteSize::from_mib(2048)));
        assert_eq!(cli.signal.map(|s| s.signal()), Some(Signal::SIGTERM));
        assert_eq!(cli.gpus, vec![0, 1]);
        assert_eq!(cli.command, vec!["python", "train.py", "--epochs", "3"]);
    }

    #[test]
    fn test_defaults_left_to_config() {
        let cli = Cli::try_parse_from(["gml", "--", "true"]).unwrap();
        assert!(cli.limit.is_none());
        assert!(cli.signal.is_none());
        assert!(!cli.dry_run);
        assert_eq!(cli.command, vec!["true"]);
    }

    #[test]
    fn test_missing_command_is_usage_error() {
        let err = Cli::try_parse_from(["gml", "-l", "1MB"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(Cli::try_parse_from(["gml", "-l", "huge", "--", "true"]).is_err());
        assert!(Cli::try_parse_from(["gml", "-s", "SIGNOPE", "--", "true"]).is_err());
    }

    #[test]
    fn test_help_exits_zero() {
        let err = Cli::try_parse_from(["gml", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }
}
