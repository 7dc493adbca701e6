//! Artifact I/O for synthesized captures.
//!
//! The layout is chosen from the output file name by
//! [`ArtifactFormat::from_path`]: `.npy` writes a NumPy complex64 array,
//! anything else writes raw interleaved `f32` I/Q pairs.
//!
//! # Example
//!
//! ```rust,no_run
//! use iqlab_core::io::{read_artifact, write_artifact};
//! use iqlab_core::types::IQSample;
//!
//! let samples = vec![IQSample::new(0.5, -0.5); 4];
//! write_artifact("/tmp/capture.npy", &samples).unwrap();
//! assert_eq!(read_artifact("/tmp/capture.npy").unwrap().len(), 4);
//! ```

mod format;
pub mod npy;

pub use format::{parse_cf32_bytes, to_cf32_bytes, ArtifactFormat};

use crate::types::{IQSample, SynthError, SynthResult};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> SynthResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| SynthError::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Write `samples` to `path` in the layout its extension selects, creating
/// parent directories as needed.
pub fn write_artifact(path: impl AsRef<Path>, samples: &[IQSample]) -> SynthResult<ArtifactFormat> {
    let path = path.as_ref();
    let format = ArtifactFormat::from_path(path);
    ensure_parent_dir(path)?;

    let file = File::create(path).map_err(|e| SynthError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let bytes = format
        .write_samples(&mut writer, samples)
        .and_then(|n| writer.flush().map(|_| n))
        .map_err(|e| SynthError::io(path, e))?;

    tracing::debug!(path = %path.display(), format = %format, bytes, "Wrote artifact");
    Ok(format)
}

/// Read every sample back from an artifact written by [`write_artifact`].
pub fn read_artifact(path: impl AsRef<Path>) -> SynthResult<Vec<IQSample>> {
    let path = path.as_ref();
    let format = ArtifactFormat::from_path(path);
    let file = File::open(path).map_err(|e| SynthError::io(path, e))?;

    format
        .read_samples(&mut BufReader::new(file))
        .map_err(|e| SynthError::Format {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/deeper/capture.iq");
        let samples = vec![IQSample::new(0.25, 0.75); 10];

        let format = write_artifact(&path, &samples).unwrap();
        assert_eq!(format, ArtifactFormat::Cf32);
        assert_eq!(fs::metadata(&path).unwrap().len(), 80);
        assert_eq!(read_artifact(&path).unwrap().len(), 10);
    }

    #[test]
    fn test_npy_file_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("capture.npy");
        let samples: Vec<IQSample> = (0..100)
            .map(|i| IQSample::new(i as f64 / 100.0, -(i as f64) / 100.0))
            .collect();

        write_artifact(&path, &samples).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x93NUMPY"));

        let decoded = read_artifact(&path).unwrap();
        for (orig, dec) in samples.iter().zip(decoded.iter()) {
            assert!((orig - dec).norm() < 1e-6);
        }
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_artifact(temp_dir.path().join("absent.iq")).unwrap_err();
        assert!(matches!(err, SynthError::Io { .. }));
    }

    #[test]
    fn test_read_corrupt_npy() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("corrupt.npy");
        fs::write(&path, b"definitely not numpy").unwrap();
        assert!(matches!(read_artifact(&path), Err(SynthError::Format { .. })));
    }
}
