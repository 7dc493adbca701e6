//! Synthesis engine: spec → IQ samples → artifact + sidecar
//!
//! Components are applied in a fixed order:
//!
//! 1. Tones are summed into a zeroed accumulator.
//! 2. Gaussian noise (independent I and Q, each with std `noise_sigma`) is
//!    added from a `StdRng` seeded with the spec seed. All I draws come
//!    before all Q draws.
//! 3. The burst window is overwritten with a unit-amplitude tone at the burst
//!    rate. Tone and noise energy inside the window is discarded.
//! 4. If the peak magnitude exceeds 1.0 the whole buffer is scaled by
//!    `1/peak`.

use crate::io::{self, ArtifactFormat};
use crate::sidecar::{sidecar_path, GenerationMetadata};
use crate::spec::{BurstSpec, SignalSpec, Tone};
use crate::types::complex_ops::{cisoid, peak_magnitude};
use crate::types::{IQSample, SynthError, SynthResult};
use chrono::Utc;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::ops::Range;
use std::path::PathBuf;

/// Result of a successful [`generate`] call.
#[derive(Debug, Clone)]
pub struct Capture {
    /// Normalized samples as written
    pub samples: Vec<IQSample>,
    pub metadata: GenerationMetadata,
    pub artifact_path: PathBuf,
    pub sidecar_path: PathBuf,
    pub format: ArtifactFormat,
    /// Peak magnitude before normalization
    pub peak: f64,
}

impl Capture {
    pub fn normalized(&self) -> bool {
        self.peak > 1.0
    }
}

/// Add `amp * exp(j·2π·f·n/fs)` for every tone.
pub fn add_tones(samples: &mut [IQSample], tones: &[Tone], samplerate_hz: f64) {
    for tone in tones {
        for (n, sample) in samples.iter_mut().enumerate() {
            *sample += cisoid(tone.freq_hz, tone.amp, n as f64 / samplerate_hz);
        }
    }
}

/// Add complex Gaussian noise. No draws are made when `sigma` is zero.
pub fn add_noise(samples: &mut [IQSample], sigma: f64, seed: u32) -> SynthResult<()> {
    if sigma <= 0.0 {
        return Ok(());
    }
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| SynthError::invalid(format!("noise_sigma {}: {}", sigma, e)))?;
    let mut rng = StdRng::seed_from_u64(u64::from(seed));

    let re: Vec<f64> = (0..samples.len()).map(|_| normal.sample(&mut rng)).collect();
    let im: Vec<f64> = (0..samples.len()).map(|_| normal.sample(&mut rng)).collect();
    for ((sample, re), im) in samples.iter_mut().zip(re).zip(im) {
        *sample += Complex64::new(re, im);
    }
    Ok(())
}

/// Sample index window covered by a burst, clipped to `len`. Empty when the
/// burst starts at or after the end of the capture.
pub fn burst_window(burst: &BurstSpec, samplerate_hz: f64, len: usize) -> Range<usize> {
    // Truncation toward zero; start and duration are validated non-negative
    let start_idx = (burst.start_s * samplerate_hz) as usize;
    let dur_idx = (burst.duration_s * samplerate_hz) as usize;
    if start_idx >= len {
        return len..len;
    }
    start_idx..len.min(start_idx.saturating_add(dur_idx))
}

/// Overwrite the burst window with a unit-amplitude tone at the burst rate,
/// phase-referenced to the start of the capture.
pub fn apply_burst(samples: &mut [IQSample], burst: &BurstSpec, samplerate_hz: f64) {
    let window = burst_window(burst, samplerate_hz, samples.len());
    for n in window {
        samples[n] = cisoid(burst.rate_hz, 1.0, n as f64 / samplerate_hz);
    }
}

/// Scale everything by `1/peak` when the peak magnitude exceeds 1.0.
///
/// Returns the peak magnitude measured before scaling.
pub fn normalize(samples: &mut [IQSample]) -> f64 {
    let peak = peak_magnitude(samples);
    if peak > 1.0 {
        let scale = 1.0 / peak;
        for s in samples.iter_mut() {
            *s *= scale;
        }
    }
    peak
}

/// Render a spec into normalized samples without touching the filesystem.
pub fn synthesize(spec: &SignalSpec) -> SynthResult<Vec<IQSample>> {
    synthesize_with_peak(spec).map(|(samples, _)| samples)
}

fn synthesize_with_peak(spec: &SignalSpec) -> SynthResult<(Vec<IQSample>, f64)> {
    spec.validate()?;

    let n = spec
        .num_samples()
        .ok_or_else(|| SynthError::invalid("sample count is not representable"))?;
    let sr = spec.samplerate_hz;
    let mut samples = vec![Complex64::new(0.0, 0.0); n];

    add_tones(&mut samples, &spec.tones, sr);
    add_noise(&mut samples, spec.noise_sigma, spec.seed)?;
    if let Some(burst) = &spec.burst {
        apply_burst(&mut samples, burst, sr);
    }
    let peak = normalize(&mut samples);

    tracing::debug!(samples = n, peak, "Synthesized capture");
    Ok((samples, peak))
}

/// Synthesize a spec and write the artifact followed by its sidecar.
///
/// Both files exist when this returns `Ok`.
pub fn generate(spec: &SignalSpec) -> SynthResult<Capture> {
    let span = tracing::info_span!("generate", out = %spec.output_path.display(), seed = spec.seed);
    let _enter = span.enter();

    let (samples, peak) = synthesize_with_peak(spec)?;
    let format = io::write_artifact(&spec.output_path, &samples)?;

    let metadata = GenerationMetadata::from_spec(spec, Utc::now());
    let meta_path = sidecar_path(&spec.output_path);
    metadata.write(&meta_path)?;

    let capture = Capture {
        samples,
        metadata,
        artifact_path: spec.output_path.clone(),
        sidecar_path: meta_path,
        format,
        peak,
    };
    tracing::info!(
        samples = capture.samples.len(),
        format = %format,
        normalized = capture.normalized(),
        "Wrote capture and metadata"
    );
    Ok(capture)
}
