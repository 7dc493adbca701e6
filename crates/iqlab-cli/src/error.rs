//! CLI error types

use iqlab_core::{ConfigError, SynthError};
use iqlab_sim::{RunError, SurveyError};
use thiserror::Error;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Synth(#[from] SynthError),

    #[error("{0}")]
    Run(#[from] RunError),

    #[error("Survey error: {0}")]
    Survey(#[from] SurveyError),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
