//! iqlab CLI - command-line tools for contained IQ laboratory work
//!
//! Three binaries share this library:
//! - `iqgen` synthesizes one simulated capture plus its sidecar
//! - `iqlab-run` executes an experiment manifest behind the safety gate
//! - `iqlab-survey` logs placeholder spectrum snapshots
//!
//! Diagnostics go to stderr through `tracing`. Operator notices (`[+]`, `[!]`)
//! are printed to stdout.

use iqlab_core::observe::{init_logging, LogLevel};
use iqlab_core::LabConfig;
use std::path::Path;
use std::process::ExitCode;

pub mod commands;
mod error;

pub use error::{CliError, CliResult};

/// Load configuration from `explicit` if given, otherwise from the search path.
pub fn load_config(explicit: Option<&Path>) -> CliResult<LabConfig> {
    let config = match explicit {
        Some(path) => LabConfig::load_from(path)?,
        None => LabConfig::load()?,
    };
    Ok(config)
}

/// Install the subscriber, letting `--log-level` override the configured level.
pub fn init_tracing(config: &LabConfig, level: Option<LogLevel>) {
    let mut logging = config.logging.clone();
    if let Some(level) = level {
        logging.level = level;
    }
    init_logging(&logging);
}

/// Map a command result onto the process exit status.
pub fn finish(result: CliResult<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("[x] {}", err);
            ExitCode::FAILURE
        }
    }
}
