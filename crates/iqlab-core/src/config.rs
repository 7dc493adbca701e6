//! # Configuration System
//!
//! YAML-based configuration for the iqlab tools:
//!
//! - Logging (level, format, module filters)
//! - Run defaults (output directory for run bundles)
//! - Spectral survey settings (device id, frequency span, snapshot cadence)
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `IQLAB_CONFIG` environment variable
//! 2. `./iqlab.yaml` (current directory)
//! 3. `~/.config/iqlab/config.yaml` (user config)
//! 4. `/etc/iqlab/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! logging:
//!   level: info
//!   format: json
//!
//! run:
//!   outdir: "runs"
//!
//! survey:
//!   output_dir: "survey_logs"
//!   device_id: "bench-sdr-01"
//!   freq_start_hz: 1.0e6
//!   freq_end_hz: 6.0e9
//!   num_bins: 1024
//!   snapshot_interval_secs: 10
//!   num_snapshots: 6
//! ```

use crate::observe::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "IQLAB_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),

    #[error("failed to read config: {0}")]
    ReadError(String),

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid config: {}", .0.join("; "))]
    ValidationError(Vec<String>),
}

/// Defaults for orchestrated runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Directory under which run bundles are created
    pub outdir: PathBuf,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("runs"),
        }
    }
}

/// Spectral survey logger settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Directory receiving snapshot and run metadata files
    pub output_dir: PathBuf,
    /// Local identifier for the device under test
    pub device_id: String,
    pub freq_start_hz: f64,
    pub freq_end_hz: f64,
    /// Number of spectrum bins per snapshot
    pub num_bins: usize,
    /// Delay between consecutive snapshots
    pub snapshot_interval_secs: f64,
    pub num_snapshots: usize,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("survey_logs"),
            device_id: "device-under-test-serial".to_string(),
            freq_start_hz: 1e6, // 1 MHz
            freq_end_hz: 6e9,   // 6 GHz
            num_bins: 1024,
            snapshot_interval_secs: 10.0,
            num_snapshots: 6,
        }
    }
}

impl SurveyConfig {
    /// Delay between snapshots. Values [`validate`](Self::validate) rejects
    /// map to the longest representable duration.
    pub fn snapshot_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.snapshot_interval_secs).unwrap_or(Duration::MAX)
    }

    /// Validate the survey settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut violations = Vec::new();

        if !(self.freq_start_hz.is_finite() && self.freq_end_hz.is_finite()) {
            violations.push("survey frequencies must be finite".to_string());
        } else if self.freq_end_hz < self.freq_start_hz {
            violations.push("freq_end_hz must not be below freq_start_hz".to_string());
        }
        if self.num_bins == 0 {
            violations.push("num_bins must be > 0".to_string());
        }
        if Duration::try_from_secs_f64(self.snapshot_interval_secs).is_err() {
            violations.push(format!(
                "snapshot_interval_secs must be a non-negative duration in range, got {}",
                self.snapshot_interval_secs
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationError(violations))
        }
    }
}

/// Complete iqlab configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Configuration version
    pub version: String,
    pub logging: LogConfig,
    pub run: RunSettings,
    pub survey: SurveyConfig,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            logging: LogConfig::default(),
            run: RunSettings::default(),
            survey: SurveyConfig::default(),
        }
    }
}

impl LabConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{} points to missing {}",
                    CONFIG_ENV,
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./iqlab.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "iqlab") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/iqlab/config.yaml"));

        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.outdir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(vec![
                "run.outdir must not be empty".to_string(),
            ]));
        }
        self.survey.validate()
    }
}
