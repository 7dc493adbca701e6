//! Generation metadata sidecar.
//!
//! Every artifact `<out>` is accompanied by `<out>.meta.json`:
//!
//! ```json
//! {
//!   "generated_at": "2026-10-18T09:30:00.123456Z",
//!   "duration_s": 5.0,
//!   "samplerate_hz": 2000000.0,
//!   "tones": [{ "freq_hz": 100000.0, "amp": 0.8 }],
//!   "noise_sigma": 0.01,
//!   "burst_spec": "0.2:0.05:5",
//!   "seed": 42,
//!   "file": "capture.iq",
//!   "note": "Simulated IQ for safe, in-cage or offline analysis only. Do not transmit."
//! }
//! ```

use crate::spec::{SignalSpec, Tone};
use crate::types::{SynthError, SynthResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Fixed reminder recorded in every sidecar.
pub const SAFETY_NOTE: &str =
    "Simulated IQ for safe, in-cage or offline analysis only. Do not transmit.";

/// Suffix appended to the artifact path.
pub const SIDECAR_SUFFIX: &str = ".meta.json";

/// ISO-8601 UTC timestamp with microseconds and a `Z` suffix.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Sidecar path for an artifact: the full artifact path plus `.meta.json`.
pub fn sidecar_path(artifact: impl AsRef<Path>) -> PathBuf {
    let mut raw: OsString = artifact.as_ref().as_os_str().to_owned();
    raw.push(SIDECAR_SUFFIX);
    PathBuf::from(raw)
}

/// Description of how one artifact was generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub generated_at: String,
    pub duration_s: f64,
    pub samplerate_hz: f64,
    pub tones: Vec<Tone>,
    pub noise_sigma: f64,
    pub burst_spec: String,
    pub seed: u32,
    pub file: String,
    pub note: String,
}

impl GenerationMetadata {
    pub fn from_spec(spec: &SignalSpec, generated_at: DateTime<Utc>) -> Self {
        let file = spec
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            generated_at: iso_timestamp(generated_at),
            duration_s: spec.duration_s,
            samplerate_hz: spec.samplerate_hz,
            tones: spec.tones.clone(),
            noise_sigma: spec.noise_sigma,
            burst_spec: spec.burst_spec().to_string(),
            seed: spec.seed,
            file,
            note: SAFETY_NOTE.to_string(),
        }
    }

    /// Write as pretty-printed JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> SynthResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| SynthError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(|e| SynthError::io(path, e))
    }

    pub fn read(path: impl AsRef<Path>) -> SynthResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SynthError::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::BurstSpec;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_sidecar_path_appends_suffix() {
        assert_eq!(
            sidecar_path("runs/a/capture.iq"),
            PathBuf::from("runs/a/capture.iq.meta.json")
        );
        assert_eq!(sidecar_path("x.npy"), PathBuf::from("x.npy.meta.json"));
    }

    #[test]
    fn test_from_spec() {
        let spec = SignalSpec::new(5.0, 2e6, "out/dir/capture.iq")
            .with_tone(Tone::new(100e3, 0.8))
            .with_noise(0.01)
            .with_burst(BurstSpec::new(0.2, 0.05, 5.0))
            .with_seed(9);
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let meta = GenerationMetadata::from_spec(&spec, at);

        assert_eq!(meta.generated_at, "2026-10-18T09:30:00.000000Z");
        assert_eq!(meta.file, "capture.iq");
        assert_eq!(meta.burst_spec, "0.2:0.05:5");
        assert_eq!(meta.seed, 9);
        assert_eq!(meta.note, SAFETY_NOTE);
    }

    #[test]
    fn test_json_schema() {
        let spec = SignalSpec::new(1.0, 1e3, "c.iq").with_tone(Tone::new(10.0, 1.0));
        let meta = GenerationMetadata::from_spec(&spec, Utc::now());
        let value = serde_json::to_value(&meta).unwrap();

        for key in [
            "generated_at",
            "duration_s",
            "samplerate_hz",
            "tones",
            "noise_sigma",
            "burst_spec",
            "seed",
            "file",
            "note",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["tones"][0]["freq_hz"], 10.0);
        assert_eq!(value["burst_spec"], "");
    }

    #[test]
    fn test_write_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("c.iq.meta.json");
        let spec = SignalSpec::new(1.0, 1e3, "c.iq");
        let meta = GenerationMetadata::from_spec(&spec, Utc::now());

        meta.write(&path).unwrap();
        assert_eq!(GenerationMetadata::read(&path).unwrap(), meta);
    }
}
