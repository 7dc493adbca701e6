//! Spectral survey logger
//!
//! Writes a run record followed by a fixed number of spectrum snapshots to
//! `output_dir`, one JSON file each:
//!
//! - `run_metadata_{unix}.json`: `{run_started, device_id, notes}`
//! - `snapshot_{i}_{unix}.json`: `{timestamp, device_id, freq_start_hz,
//!   freq_end_hz, num_bins, magnitudes_db}`
//!
//! No hardware is touched. Each snapshot carries a placeholder spectrum,
//! `-120 + 20·log10(|sin(2π·f/1e8)| + 1)` dB over `num_bins` evenly spaced
//! frequencies, so downstream tooling can be exercised offline.

use crate::error::SurveyError;
use chrono::{DateTime, Utc};
use iqlab_core::sidecar::iso_timestamp;
use iqlab_core::SurveyConfig;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SURVEY_NOTE: &str =
    "Local benign RF survey; do not use for transmission or remote activation";

/// Placeholder spectrum floor in dB
const FLOOR_DB: f64 = -120.0;
/// Ripple period of the placeholder spectrum in Hz
const RIPPLE_HZ: f64 = 1e8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub run_started: String,
    pub device_id: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: String,
    pub device_id: String,
    pub freq_start_hz: f64,
    pub freq_end_hz: f64,
    pub num_bins: usize,
    pub magnitudes_db: Vec<f64>,
}

/// Files produced by a completed survey.
#[derive(Debug, Clone)]
pub struct SurveyReport {
    pub metadata_path: PathBuf,
    pub snapshots: Vec<PathBuf>,
}

/// `n` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

pub struct SpectralSurvey {
    config: SurveyConfig,
}

impl SpectralSurvey {
    pub fn new(config: SurveyConfig) -> Result<Self, SurveyError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Placeholder magnitudes in dB, one per bin.
    pub fn placeholder_spectrum(&self) -> Vec<f64> {
        linspace(self.config.freq_start_hz, self.config.freq_end_hz, self.config.num_bins)
            .into_iter()
            .map(|f| FLOOR_DB + 20.0 * ((2.0 * PI * f / RIPPLE_HZ).sin().abs() + 1.0).log10())
            .collect()
    }

    pub fn snapshot(&self, at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            timestamp: iso_timestamp(at),
            device_id: self.config.device_id.clone(),
            freq_start_hz: self.config.freq_start_hz,
            freq_end_hz: self.config.freq_end_hz,
            num_bins: self.config.num_bins,
            magnitudes_db: self.placeholder_spectrum(),
        }
    }

    /// Write the survey run record.
    pub fn write_run_metadata(&self, at: DateTime<Utc>) -> Result<PathBuf, SurveyError> {
        let record = SurveyRecord {
            run_started: iso_timestamp(at),
            device_id: self.config.device_id.clone(),
            notes: SURVEY_NOTE.to_string(),
        };
        let path = self
            .config
            .output_dir
            .join(format!("run_metadata_{}.json", at.timestamp()));
        write_json(&path, &record)?;
        Ok(path)
    }

    /// Write snapshot `index`.
    pub fn take_snapshot(&self, index: usize, at: DateTime<Utc>) -> Result<PathBuf, SurveyError> {
        let path = self
            .config
            .output_dir
            .join(format!("snapshot_{}_{}.json", index, at.timestamp()));
        write_json(&path, &self.snapshot(at))?;
        tracing::debug!(index, path = %path.display(), "Saved snapshot");
        Ok(path)
    }

    /// Write the run record and every snapshot, sleeping the configured
    /// interval between snapshots.
    pub fn run(&self) -> Result<SurveyReport, SurveyError> {
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir).map_err(|e| SurveyError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let metadata_path = self.write_run_metadata(Utc::now())?;
        let interval = self.config.snapshot_interval();
        let mut snapshots = Vec::with_capacity(self.config.num_snapshots);

        for i in 0..self.config.num_snapshots {
            if i > 0 && !interval.is_zero() {
                std::thread::sleep(interval);
            }
            snapshots.push(self.take_snapshot(i, Utc::now())?);
        }

        tracing::info!(snapshots = snapshots.len(), dir = %dir.display(), "Survey complete");
        Ok(SurveyReport {
            metadata_path,
            snapshots,
        })
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SurveyError> {
    let io_err = |e| SurveyError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush().map_err(io_err)
}
