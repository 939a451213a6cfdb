//! gml - GPU memory limiter
//!
//! Runs a command and kills it when its GPU memory use exceeds a limit.

use clap::Parser;
use gml::cli::Cli;
use gml::commands::run_supervised;
use gml::config::{Config, ConfigBuilder};
use gml::error::{AppError, NvmlError};
use gml::nvml::NvmlManager;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging before the config file is read so its warnings show.
    // Without RUST_LOG, verbosity is gated by the max level, which the config
    // file may raise once loaded.
    let explicit_filter = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,gml=debug"),
    )
    .format_timestamp(None)
    .init();
    if !explicit_filter {
        log::set_max_level(max_level(cli.verbose));
    }

    let config = build_config(&cli);
    if let (Ok(config), false) = (&config, explicit_filter) {
        log::set_max_level(max_level(config.general.verbose));
    }

    match config.and_then(|config| run(&cli, &config)) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

fn max_level(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    }
}

fn build_config(cli: &Cli) -> Result<Config, AppError> {
    let config = ConfigBuilder::new()
        .with_file(cli.config.as_deref())?
        .with_verbose(cli.verbose)
        .with_limit(cli.limit)
        .with_signal(cli.signal)
        .with_interval(cli.interval)
        .with_dry_run(cli.dry_run)
        .with_gpu_indices(&cli.gpus)
        .build()?;
    Ok(config)
}

fn run(cli: &Cli, config: &Config) -> Result<i32, AppError> {
    let manager = NvmlManager::new()?;
    let result = run_supervised(&manager, config, &cli.command);

    // The child's outcome stands even if the session does not close cleanly.
    if let Err(e) = manager.shutdown() {
        log::warn!("{}", e);
    }

    result
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Nvml(NvmlError::LibraryNotFound) => {
            eprintln!();
            eprintln!("Hint: Make sure the NVIDIA driver is installed.");
            eprintln!("      On Linux, install the nvidia-utils package.");
        }
        AppError::Nvml(NvmlError::InsufficientPermissions(_)) => {
            eprintln!();
            eprintln!("Hint: Try running with sudo or as root.");
        }
        AppError::GpuNotFound { .. } => {
            eprintln!();
            eprintln!("Hint: Check 'nvidia-smi -L' for the available GPU indices.");
        }
        _ => {}
    }
}
