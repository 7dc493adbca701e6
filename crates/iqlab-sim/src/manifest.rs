//! Experiment manifest schema
//!
//! A manifest is a YAML (or JSON) document:
//!
//! ```yaml
//! experiment_id: "nearfield-baseline"
//! created_at: "2026-10-18T09:00:00Z"
//! capture_parameters:
//!   duration_s: 1.0
//!   samplerate_hz: 1.0e6
//!   mode: simulated
//! stimulus:
//!   tones:
//!     - { freq_hz: 100000, amp: 0.8 }
//!     - { freq_hz: 250000 }          # amp defaults to 1.0
//!   noise_sigma: 0.01
//!   burst: { start_s: 0.2, duration_s: 0.05, burst_rate_hz: 5000 }
//!   simulated_iq_file: capture.iq
//! ```
//!
//! Loading walks the whole document once and reports every problem in a
//! single [`RunError::InvalidSpecification`]. The document is also kept
//! verbatim for the run record.

use crate::error::{RunError, RunResult};
use iqlab_core::{BurstSpec, Tone};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_EXPERIMENT_ID: &str = "run";
pub const DEFAULT_IQ_FILE: &str = "capture.iq";
pub const DEFAULT_BURST_START_S: f64 = 0.0;
pub const DEFAULT_BURST_DURATION_S: f64 = 0.05;
pub const DEFAULT_BURST_RATE_HZ: f64 = 5000.0;

/// How the capture is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureMode {
    Simulated,
    /// Any other mode string, treated as a real hardware capture
    Other(String),
}

impl CaptureMode {
    pub fn parse(s: &str) -> Self {
        match s {
            "simulated" => CaptureMode::Simulated,
            other => CaptureMode::Other(other.to_string()),
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, CaptureMode::Simulated)
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::Simulated => write!(f, "simulated"),
            CaptureMode::Other(mode) => write!(f, "{}", mode),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureParameters {
    pub duration_s: f64,
    pub samplerate_hz: f64,
    pub mode: CaptureMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stimulus {
    pub tones: Vec<Tone>,
    pub noise_sigma: f64,
    pub burst: Option<BurstSpec>,
    /// Artifact path relative to the run directory
    pub simulated_iq_file: PathBuf,
}

/// A validated experiment manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentManifest {
    pub experiment_id: String,
    pub capture: CaptureParameters,
    pub stimulus: Stimulus,
    /// Seed entropy, as loaded
    pub created_at: Option<Value>,
    /// The whole document as loaded
    pub document: serde_json::Value,
}

impl ExperimentManifest {
    /// Load and validate a manifest file.
    pub fn load(path: impl AsRef<Path>) -> RunResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RunError::io(path, e))?;
        Self::parse(&text).map_err(|e| match e {
            RunError::ManifestParse { reason, .. } => RunError::ManifestParse {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate manifest text.
    pub fn parse(text: &str) -> RunResult<Self> {
        let value: Value = serde_yaml::from_str(text).map_err(|e| RunError::ManifestParse {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Validate an already-parsed document.
    pub fn from_value(value: Value) -> RunResult<Self> {
        let document = serde_json::to_value(&value).map_err(|e| RunError::ManifestParse {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;

        let mut fields = FieldReader::default();
        let root = match &value {
            Value::Mapping(m) => Some(m),
            _ => {
                fields.violate("manifest must be a mapping");
                None
            }
        };

        let experiment_id = root
            .and_then(|m| fields.string(m, "experiment_id", "experiment_id"))
            .unwrap_or_else(|| DEFAULT_EXPERIMENT_ID.to_string());
        if experiment_id.is_empty()
            || experiment_id.contains(['/', '\\'])
            || experiment_id == ".."
        {
            fields.violate(format!(
                "experiment_id '{}' must be a non-empty name without path separators",
                experiment_id
            ));
        }

        let capture = root.and_then(|m| fields.section(m, "capture_parameters"));
        let duration_s = capture.and_then(|c| {
            fields.positive(c, "duration_s", "capture_parameters.duration_s")
        });
        let samplerate_hz = capture.and_then(|c| {
            fields.positive(c, "samplerate_hz", "capture_parameters.samplerate_hz")
        });
        let mode = capture
            .and_then(|c| fields.string(c, "mode", "capture_parameters.mode"))
            .map(|m| CaptureMode::parse(&m))
            .unwrap_or(CaptureMode::Simulated);

        let stimulus = root.and_then(|m| fields.section(m, "stimulus"));
        let tones = stimulus.map(|s| fields.tones(s)).unwrap_or_default();
        let noise_sigma = stimulus
            .and_then(|s| fields.number(s, "noise_sigma", "stimulus.noise_sigma"))
            .unwrap_or(0.0);
        if !(noise_sigma.is_finite() && noise_sigma >= 0.0) {
            fields.violate(format!(
                "stimulus.noise_sigma must be non-negative, got {}",
                noise_sigma
            ));
        }
        let burst = stimulus.and_then(|s| fields.burst(s));
        let simulated_iq_file = stimulus
            .and_then(|s| fields.string(s, "simulated_iq_file", "stimulus.simulated_iq_file"))
            .unwrap_or_else(|| DEFAULT_IQ_FILE.to_string());
        let simulated_iq_file = PathBuf::from(simulated_iq_file);
        if !is_contained_relative(&simulated_iq_file) {
            fields.violate(format!(
                "stimulus.simulated_iq_file '{}' must be a relative path inside the run directory",
                simulated_iq_file.display()
            ));
        }

        let created_at = root.and_then(|m| m.get("created_at")).cloned();

        match (duration_s, samplerate_hz, fields.violations.is_empty()) {
            (Some(duration_s), Some(samplerate_hz), true) => Ok(Self {
                experiment_id,
                capture: CaptureParameters {
                    duration_s,
                    samplerate_hz,
                    mode,
                },
                stimulus: Stimulus {
                    tones,
                    noise_sigma,
                    burst,
                    simulated_iq_file,
                },
                created_at,
                document,
            }),
            _ => Err(RunError::InvalidSpecification(fields.violations)),
        }
    }
}

/// Relative, non-empty, and free of `..` or root components.
fn is_contained_relative(path: &Path) -> bool {
    path.file_name().is_some()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Typed field access that records violations instead of stopping at the
/// first one.
#[derive(Default)]
struct FieldReader {
    violations: Vec<String>,
}

impl FieldReader {
    fn violate(&mut self, msg: impl Into<String>) {
        self.violations.push(msg.into());
    }

    /// A required mapping-valued key.
    fn section<'a>(&mut self, map: &'a Mapping, key: &str) -> Option<&'a Mapping> {
        match map.get(key) {
            Some(Value::Mapping(m)) => Some(m),
            Some(_) => {
                self.violate(format!("{} must be a mapping", key));
                None
            }
            None => {
                self.violate(format!("{} is required", key));
                None
            }
        }
    }

    /// An optional string. Absent or null yields `None`.
    fn string(&mut self, map: &Mapping, key: &str, path: &str) -> Option<String> {
        match map.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.violate(format!("{} must be a string", path));
                None
            }
        }
    }

    /// An optional number; numeric strings such as `"2e6"` are accepted.
    fn number(&mut self, map: &Mapping, key: &str, path: &str) -> Option<f64> {
        let parsed = match map.get(key) {
            None | Some(Value::Null) => return None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        if parsed.is_none() {
            self.violate(format!("{} must be a number", path));
        }
        parsed
    }

    /// A required, finite, strictly positive number.
    fn positive(&mut self, map: &Mapping, key: &str, path: &str) -> Option<f64> {
        if !map.contains_key(key) {
            self.violate(format!("{} is required", path));
            return None;
        }
        let value = self.number(map, key, path)?;
        if value.is_finite() && value > 0.0 {
            Some(value)
        } else {
            self.violate(format!("{} must be positive, got {}", path, value));
            None
        }
    }

    fn tones(&mut self, stimulus: &Mapping) -> Vec<Tone> {
        let list = match stimulus.get("tones") {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Sequence(list)) => list,
            Some(_) => {
                self.violate("stimulus.tones must be a list");
                return Vec::new();
            }
        };

        let mut tones = Vec::with_capacity(list.len());
        for (i, entry) in list.iter().enumerate() {
            let Value::Mapping(tone) = entry else {
                self.violate(format!("stimulus.tones[{}] must be a mapping", i));
                continue;
            };
            let freq_path = format!("stimulus.tones[{}].freq_hz", i);
            let freq = if tone.contains_key("freq_hz") {
                self.number(tone, "freq_hz", &freq_path)
            } else {
                self.violate(format!("{} is required", freq_path));
                None
            };
            let amp = self
                .number(tone, "amp", &format!("stimulus.tones[{}].amp", i))
                .unwrap_or(1.0);
            if let Some(freq_hz) = freq {
                if freq_hz.is_finite() && amp.is_finite() {
                    tones.push(Tone::new(freq_hz, amp));
                } else {
                    self.violate(format!("stimulus.tones[{}] must be finite", i));
                }
            }
        }
        tones
    }

    /// An empty or null burst section means no burst; missing fields take
    /// defaults.
    fn burst(&mut self, stimulus: &Mapping) -> Option<BurstSpec> {
        let burst = match stimulus.get("burst") {
            None | Some(Value::Null) => return None,
            Some(Value::Mapping(m)) if m.is_empty() => return None,
            Some(Value::Mapping(m)) => m,
            Some(_) => {
                self.violate("stimulus.burst must be a mapping");
                return None;
            }
        };

        let start_s = self
            .number(burst, "start_s", "stimulus.burst.start_s")
            .unwrap_or(DEFAULT_BURST_START_S);
        let duration_s = self
            .number(burst, "duration_s", "stimulus.burst.duration_s")
            .unwrap_or(DEFAULT_BURST_DURATION_S);
        let rate_hz = self
            .number(burst, "burst_rate_hz", "stimulus.burst.burst_rate_hz")
            .unwrap_or(DEFAULT_BURST_RATE_HZ);

        let mut ok = true;
        if !(start_s.is_finite() && start_s >= 0.0) {
            self.violate(format!("stimulus.burst.start_s must be non-negative, got {}", start_s));
            ok = false;
        }
        if !(duration_s.is_finite() && duration_s >= 0.0) {
            self.violate(format!(
                "stimulus.burst.duration_s must be non-negative, got {}",
                duration_s
            ));
            ok = false;
        }
        if !rate_hz.is_finite() {
            self.violate("stimulus.burst.burst_rate_hz must be finite");
            ok = false;
        }

        ok.then(|| BurstSpec::new(start_s, duration_s, rate_hz))
    }
}
