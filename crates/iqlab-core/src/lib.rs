//! # iqlab Core Library
//!
//! Deterministic synthesis of simulated IQ captures for offline, contained
//! laboratory analysis.
//!
//! ## Overview
//!
//! A [`SignalSpec`] fully describes one capture: duration, sample rate, a list
//! of tones, optional Gaussian noise, an optional burst window, a seed, and the
//! output path. [`synth::generate`] renders it into complex samples and writes
//! two files:
//!
//! - the artifact itself, either raw interleaved `f32` I/Q pairs or a NumPy
//!   `.npy` array of `complex64` (selected by extension)
//! - a `<artifact>.meta.json` sidecar describing how it was generated
//!
//! ## Signal Flow
//!
//! ```text
//! tones (sum) → + noise (seeded) → burst (overwrite window) → normalize → artifact + sidecar
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use iqlab_core::{SignalSpec, Tone, synth};
//!
//! let spec = SignalSpec::new(1.0, 1_000_000.0, "captures/tone.iq")
//!     .with_tone(Tone::new(100_000.0, 0.8))
//!     .with_seed(7);
//!
//! let capture = synth::generate(&spec).unwrap();
//! assert_eq!(capture.samples.len(), 1_000_000);
//! ```

pub mod config;
pub mod io;
pub mod observe;
pub mod sidecar;
pub mod spec;
pub mod synth;
pub mod types;

pub use config::{ConfigError, LabConfig, RunSettings, SurveyConfig};
pub use io::ArtifactFormat;
pub use sidecar::{GenerationMetadata, SAFETY_NOTE};
pub use spec::{BurstSpec, SignalSpec, Tone, DEFAULT_SEED};
pub use synth::Capture;
pub use types::{IQSample, SynthError, SynthResult};
