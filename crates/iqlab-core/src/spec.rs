//! Signal specification
//!
//! A [`SignalSpec`] is everything the synthesizer needs. Two equal specs
//! always produce bit-identical artifacts.
//!
//! Tones and bursts also have compact string forms used on the command line
//! and recorded in the metadata sidecar:
//!
//! | Form  | Syntax                      | Example               |
//! |-------|-----------------------------|-----------------------|
//! | Tones | `freq[:amp],freq[:amp],...` | `100e3:0.8,300e3:0.5` |
//! | Burst | `start:duration:rate`       | `0.2:0.05:5`          |

use crate::types::{IQSample, SynthError, SynthResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Seed used when none is given.
pub const DEFAULT_SEED: u32 = 42;

/// Largest sample count whose buffer can be allocated.
pub const MAX_SAMPLES: usize = isize::MAX as usize / std::mem::size_of::<IQSample>();

/// A constant-frequency, constant-amplitude complex exponential component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub freq_hz: f64,
    #[serde(default = "default_amp")]
    pub amp: f64,
}

fn default_amp() -> f64 {
    1.0
}

impl Tone {
    pub fn new(freq_hz: f64, amp: f64) -> Self {
        Self { freq_hz, amp }
    }
}

/// A time window whose samples are replaced by a unit-amplitude tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstSpec {
    /// Window start in seconds from the first sample
    pub start_s: f64,
    /// Window length in seconds
    pub duration_s: f64,
    /// Frequency of the burst waveform in Hz
    pub rate_hz: f64,
}

impl BurstSpec {
    pub fn new(start_s: f64, duration_s: f64, rate_hz: f64) -> Self {
        Self {
            start_s,
            duration_s,
            rate_hz,
        }
    }

    /// Parse a `start:duration:rate` token.
    ///
    /// An empty token means no burst. A token with fewer than three fields is
    /// ignored with a warning; extra fields are ignored.
    pub fn parse(token: &str) -> SynthResult<Option<Self>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        let parts: Vec<&str> = token.split(':').collect();
        if parts.len() < 3 {
            tracing::warn!(
                burst = token,
                "Burst spec must be burst_start:burst_dur:burst_rate, ignoring"
            );
            return Ok(None);
        }

        let mut violations = Vec::new();
        let mut field = |name: &str, raw: &str| match raw.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                violations.push(format!("burst {} '{}' is not a number", name, raw));
                0.0
            }
        };
        let start_s = field("start", parts[0]);
        let duration_s = field("duration", parts[1]);
        let rate_hz = field("rate", parts[2]);

        if !violations.is_empty() {
            return Err(SynthError::InvalidSpecification(violations));
        }
        Ok(Some(Self::new(start_s, duration_s, rate_hz)))
    }
}

impl fmt::Display for BurstSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start_s, self.duration_s, self.rate_hz)
    }
}

/// Parse a comma-separated `freq[:amp]` tone list.
///
/// Empty entries are skipped and a missing amplitude defaults to 1.0. Every
/// unparseable entry is reported in one error.
pub fn parse_tones(specs: &str) -> SynthResult<Vec<Tone>> {
    let mut tones = Vec::new();
    let mut violations = Vec::new();

    for entry in specs.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let mut parts = entry.split(':');
        let freq = parts.next().unwrap_or_default().trim().parse::<f64>();
        let amp = match parts.next() {
            Some(a) => a.trim().parse::<f64>(),
            None => Ok(1.0),
        };
        match (freq, amp) {
            (Ok(freq_hz), Ok(amp)) => tones.push(Tone::new(freq_hz, amp)),
            _ => violations.push(format!("tone '{}' is not freq[:amp]", entry)),
        }
    }

    if violations.is_empty() {
        Ok(tones)
    } else {
        Err(SynthError::InvalidSpecification(violations))
    }
}

/// Inverse of [`parse_tones`].
pub fn encode_tones(tones: &[Tone]) -> String {
    tones
        .iter()
        .map(|t| format!("{}:{}", t.freq_hz, t.amp))
        .collect::<Vec<_>>()
        .join(",")
}

/// Complete description of one synthesized capture.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSpec {
    pub duration_s: f64,
    pub samplerate_hz: f64,
    pub tones: Vec<Tone>,
    pub noise_sigma: f64,
    pub burst: Option<BurstSpec>,
    /// Burst token exactly as the operator gave it, recorded in the sidecar
    pub burst_token: String,
    pub seed: u32,
    pub output_path: PathBuf,
}

impl SignalSpec {
    /// A silent capture with no tones, noise or burst.
    pub fn new(duration_s: f64, samplerate_hz: f64, output_path: impl AsRef<Path>) -> Self {
        Self {
            duration_s,
            samplerate_hz,
            tones: Vec::new(),
            noise_sigma: 0.0,
            burst: None,
            burst_token: String::new(),
            seed: DEFAULT_SEED,
            output_path: output_path.as_ref().to_path_buf(),
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tones.push(tone);
        self
    }

    pub fn with_tones(mut self, tones: impl IntoIterator<Item = Tone>) -> Self {
        self.tones.extend(tones);
        self
    }

    pub fn with_noise(mut self, sigma: f64) -> Self {
        self.noise_sigma = sigma;
        self
    }

    /// Set the burst window. The recorded token becomes its
    /// `start:duration:rate` rendering.
    pub fn with_burst(mut self, burst: BurstSpec) -> Self {
        self.burst = Some(burst);
        self.burst_token = burst.to_string();
        self
    }

    /// Record the burst token as typed, including one too short to parse.
    pub fn with_burst_token(mut self, token: impl Into<String>) -> Self {
        self.burst_token = token.into();
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Number of samples, `ceil(duration_s * samplerate_hz)`.
    ///
    /// `None` when the product is not finite, is negative or exceeds
    /// [`MAX_SAMPLES`].
    pub fn num_samples(&self) -> Option<usize> {
        let n = (self.duration_s * self.samplerate_hz).ceil();
        if n.is_finite() && n >= 0.0 && n <= MAX_SAMPLES as f64 {
            usize::try_from(n as u64).ok().filter(|&n| n <= MAX_SAMPLES)
        } else {
            None
        }
    }

    /// Raw burst token as recorded in the sidecar, empty when there is none.
    pub fn burst_spec(&self) -> &str {
        &self.burst_token
    }

    /// Check every numeric parameter, reporting all violations together.
    pub fn validate(&self) -> SynthResult<()> {
        let mut violations = Vec::new();

        if !(self.duration_s.is_finite() && self.duration_s > 0.0) {
            violations.push(format!("duration_s must be positive, got {}", self.duration_s));
        }
        if !(self.samplerate_hz.is_finite() && self.samplerate_hz > 0.0) {
            violations.push(format!(
                "samplerate_hz must be positive, got {}",
                self.samplerate_hz
            ));
        }
        if violations.is_empty() && self.num_samples().is_none() {
            violations.push(format!(
                "duration_s * samplerate_hz must not exceed {} samples, got {}",
                MAX_SAMPLES,
                self.duration_s * self.samplerate_hz
            ));
        }
        if !(self.noise_sigma.is_finite() && self.noise_sigma >= 0.0) {
            violations.push(format!(
                "noise_sigma must be non-negative, got {}",
                self.noise_sigma
            ));
        }
        for (i, tone) in self.tones.iter().enumerate() {
            if !tone.freq_hz.is_finite() || !tone.amp.is_finite() {
                violations.push(format!("tones[{}] must be finite", i));
            }
        }
        if let Some(burst) = &self.burst {
            if !(burst.start_s.is_finite() && burst.start_s >= 0.0) {
                violations.push(format!(
                    "burst start_s must be non-negative, got {}",
                    burst.start_s
                ));
            }
            if !(burst.duration_s.is_finite() && burst.duration_s >= 0.0) {
                violations.push(format!(
                    "burst duration_s must be non-negative, got {}",
                    burst.duration_s
                ));
            }
            if !burst.rate_hz.is_finite() {
                violations.push("burst rate_hz must be finite".to_string());
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SynthError::InvalidSpecification(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tones() {
        let tones = parse_tones("100e3:0.8,300e3:0.5").unwrap();
        assert_eq!(tones, vec![Tone::new(100_000.0, 0.8), Tone::new(300_000.0, 0.5)]);

        // Missing amplitude and empty entries
        let tones = parse_tones("1000,,2000:0.25,").unwrap();
        assert_eq!(tones, vec![Tone::new(1000.0, 1.0), Tone::new(2000.0, 0.25)]);

        assert!(parse_tones("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_tones_reports_every_bad_entry() {
        let err = parse_tones("abc:1,1000:0.5,2000:x").unwrap_err();
        let violations = err.violations();
        assert_eq!(violations.len(), 2);
        assert!(violations[0].contains("abc:1"));
        assert!(violations[1].contains("2000:x"));
    }

    #[test]
    fn test_encode_tones() {
        let tones = vec![Tone::new(100_000.0, 0.8), Tone::new(250.5, 1.0)];
        assert_eq!(encode_tones(&tones), "100000:0.8,250.5:1");
        assert_eq!(parse_tones(&encode_tones(&tones)).unwrap(), tones);
    }

    #[test]
    fn test_burst_parse() {
        let burst = BurstSpec::parse("0.2:0.05:5").unwrap().unwrap();
        assert_eq!(burst, BurstSpec::new(0.2, 0.05, 5.0));
        assert_eq!(burst.to_string(), "0.2:0.05:5");

        assert_eq!(BurstSpec::parse("").unwrap(), None);
        // Too few fields are ignored rather than rejected
        assert_eq!(BurstSpec::parse("0.2:0.05").unwrap(), None);
        assert!(BurstSpec::parse("a:0.05:b").is_err());
    }

    #[test]
    fn test_num_samples_rounds_up() {
        assert_eq!(SignalSpec::new(1.0, 1_000_000.0, "x.iq").num_samples(), Some(1_000_000));
        assert_eq!(SignalSpec::new(0.25, 10.0, "x.iq").num_samples(), Some(3));
    }

    #[test]
    fn test_oversized_capture_rejected() {
        let spec = SignalSpec::new(1e30, 1e30, "x.iq");
        assert_eq!(spec.num_samples(), None);

        let err = spec.validate().unwrap_err();
        let v = err.violations();
        assert_eq!(v.len(), 1);
        assert!(v[0].contains("must not exceed"));
    }

    #[test]
    fn test_burst_token_kept_verbatim() {
        let burst = BurstSpec::parse("0.20:0.050:5").unwrap().unwrap();
        let spec = SignalSpec::new(1.0, 1e3, "x.iq")
            .with_burst(burst)
            .with_burst_token("0.20:0.050:5");
        assert_eq!(spec.burst_spec(), "0.20:0.050:5");

        // Ignored burst still records what was typed
        assert_eq!(BurstSpec::parse("0.2:0.05").unwrap(), None);
        let spec = SignalSpec::new(1.0, 1e3, "x.iq").with_burst_token("0.2:0.05");
        assert_eq!(spec.burst, None);
        assert_eq!(spec.burst_spec(), "0.2:0.05");
    }

    #[test]
    fn test_validate_aggregates() {
        let spec = SignalSpec::new(0.0, -5.0, "x.iq")
            .with_noise(-1.0)
            .with_burst(BurstSpec::new(-0.1, 0.05, 5.0));
        let err = spec.validate().unwrap_err();
        let v = err.violations();
        assert_eq!(v.len(), 4);
        assert!(v.iter().any(|m| m.starts_with("duration_s")));
        assert!(v.iter().any(|m| m.starts_with("samplerate_hz")));
        assert!(v.iter().any(|m| m.starts_with("noise_sigma")));
        assert!(v.iter().any(|m| m.starts_with("burst start_s")));
    }

    #[test]
    fn test_validate_ok() {
        let spec = SignalSpec::new(2.0, 1e6, "x.iq")
            .with_tone(Tone::new(1e9, 3.0))
            .with_burst(BurstSpec::new(10.0, 1.0, 5.0));
        assert!(spec.validate().is_ok());
        assert_eq!(spec.burst_spec(), "10:1:5");
    }
}
