//! Core types for IQ synthesis
//!
//! Signals are represented as complex baseband samples where the real part is
//! the in-phase (I) component and the imaginary part is the quadrature (Q)
//! component.
//!
//! ```text
//!            Q (Imaginary)
//!            ^
//!            |     * (I=0.7, Q=0.7)
//!            |    /
//!            |   / magnitude = 1.0
//!            |  /  phase = 45°
//!            | /
//!   ---------+---------> I (Real)
//!            |
//! ```
//!
//! Samples are held in `f64` precision while synthesizing and narrowed to
//! `f32` only when an artifact is written.

use num_complex::Complex64;
use std::path::PathBuf;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// Result type for synthesis and artifact operations
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors that can occur while synthesizing or persisting a capture
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// One or more parameters are malformed or out of range. Every violation
    /// found in a single validation pass is listed.
    #[error("Invalid specification: {}", .0.join("; "))]
    InvalidSpecification(Vec<String>),

    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unreadable artifact {}: {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    #[error("Metadata serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl SynthError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SynthError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(violation: impl Into<String>) -> Self {
        SynthError::InvalidSpecification(vec![violation.into()])
    }

    /// Individual violations for an `InvalidSpecification` error.
    pub fn violations(&self) -> &[String] {
        match self {
            SynthError::InvalidSpecification(v) => v,
            _ => &[],
        }
    }
}

/// Helper functions for working with complex samples
pub mod complex_ops {
    use super::*;
    use std::f64::consts::PI;

    /// Complex exponential `amp * exp(j·2π·freq·t)`.
    #[inline]
    pub fn cisoid(freq_hz: f64, amp: f64, t: f64) -> IQSample {
        Complex64::from_polar(amp, 2.0 * PI * freq_hz * t)
    }

    /// Largest sample magnitude, 0.0 for an empty buffer.
    pub fn peak_magnitude(samples: &[IQSample]) -> f64 {
        samples.iter().map(|s| s.norm()).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_specification_lists_all() {
        let err = SynthError::InvalidSpecification(vec![
            "duration_s must be positive".into(),
            "samplerate_hz must be positive".into(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("duration_s"));
        assert!(msg.contains("samplerate_hz"));
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_peak_magnitude() {
        let samples = vec![
            IQSample::new(0.3, 0.4),
            IQSample::new(-3.0, 4.0),
            IQSample::new(0.0, 0.0),
        ];
        assert!((complex_ops::peak_magnitude(&samples) - 5.0).abs() < 1e-12);
        assert_eq!(complex_ops::peak_magnitude(&[]), 0.0);
    }

    #[test]
    fn test_cisoid_magnitude() {
        let s = complex_ops::cisoid(1234.5, 0.8, 0.37);
        assert!((s.norm() - 0.8).abs() < 1e-12);
    }
}
