//! Error types for runs and surveys.

use iqlab_core::{ConfigError, SynthError};
use std::path::PathBuf;

pub type RunResult<T> = Result<T, RunError>;

/// Errors that stop an orchestrated run.
///
/// A safety-gate rejection is not an error; see
/// [`RunOutcome::Rejected`](crate::orchestrator::RunOutcome::Rejected).
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Malformed or out-of-range manifest fields, all of them at once.
    #[error("Invalid specification: {}", .0.join("; "))]
    InvalidSpecification(Vec<String>),

    /// A non-simulated capture passed the gate but no capture path exists.
    #[error(
        "Real SDR capture (mode '{mode}') is not implemented. Use simulated mode or add a capture adapter."
    )]
    NotImplemented { mode: String },

    #[error("Failed to parse manifest {}: {reason}", .path.display())]
    ManifestParse { path: PathBuf, reason: String },

    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Synthesis failed: {0}")]
    Synthesis(SynthError),

    #[error("Metadata serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl RunError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<SynthError> for RunError {
    fn from(err: SynthError) -> Self {
        match err {
            SynthError::InvalidSpecification(v) => RunError::InvalidSpecification(v),
            SynthError::Io { path, source } => RunError::Io { path, source },
            other => RunError::Synthesis(other),
        }
    }
}

/// Errors from the spectral survey logger.
#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synth_errors_flatten() {
        let err: RunError = SynthError::InvalidSpecification(vec!["duration_s".into()]).into();
        assert!(matches!(err, RunError::InvalidSpecification(ref v) if v.len() == 1));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: RunError = SynthError::Io {
            path: PathBuf::from("/x"),
            source: io,
        }
        .into();
        assert!(matches!(err, RunError::Io { .. }));
    }

    #[test]
    fn test_not_implemented_message() {
        let err = RunError::NotImplemented { mode: "real".into() };
        assert!(err.to_string().contains("'real'"));
    }
}
