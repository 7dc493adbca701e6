//! Run orchestrator: manifest → gated synthesis → run bundle
//!
//! ```text
//!  Loaded ──gate──► Gated ──► Synthesizing ──► Finalized
//!     │
//!     └──────────► Rejected   (non-simulated mode, no override)
//! ```
//!
//! Loading creates `{outdir}/{experiment_id}_{%Y%m%dT%H%M%SZ}/`. A rejected
//! run leaves that directory empty. A finalized run holds the IQ artifact,
//! its `.meta.json` sidecar and `run_metadata.json`.
//!
//! The gate is the only safety control. A run whose mode is not `simulated`
//! proceeds only when the operator override is set, and then stops with
//! [`RunError::NotImplemented`] because there is no hardware capture path.

use crate::error::{RunError, RunResult};
use crate::manifest::{CaptureMode, ExperimentManifest};
use chrono::{DateTime, Utc};
use iqlab_core::sidecar::iso_timestamp;
use iqlab_core::synth::{self, Capture};
use iqlab_core::{SignalSpec, Tone};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name of the run-level record inside the run directory.
pub const RUN_METADATA_FILE: &str = "run_metadata.json";

/// Fixed note recorded in every finalized run.
pub const RUN_NOTE: &str = "Simulated run completed. No over-air transmissions performed.";

/// Environment variable that must equal `"1"` to lift the simulated-only gate.
pub const ALLOW_REAL_CAPTURE_ENV: &str = "ALLOW_REAL_CAPTURE";

/// Orchestrator settings, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Parent directory for run bundles
    pub outdir: PathBuf,
    /// Operator override for non-simulated modes
    pub allow_real_capture: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("runs"),
            allow_real_capture: false,
        }
    }
}

impl RunConfig {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            ..Default::default()
        }
    }

    pub fn with_real_capture_override(mut self, allow: bool) -> Self {
        self.allow_real_capture = allow;
        self
    }

    /// Interpret an `ALLOW_REAL_CAPTURE` value: only the literal `"1"` counts.
    pub fn override_from(value: Option<&str>) -> bool {
        value == Some("1")
    }
}

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Loaded,
    Gated,
    Synthesizing,
    Finalized,
    Rejected,
}

/// A run whose directory exists and whose manifest is valid.
#[derive(Debug, Clone)]
pub struct PendingRun {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub manifest: ExperimentManifest,
    pub state: RunState,
}

/// Everything a finalized run produced.
#[derive(Debug, Clone)]
pub struct RunBundle {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub artifact_path: PathBuf,
    /// Sidecar inside the run directory
    pub sidecar_path: Option<PathBuf>,
    pub metadata_path: PathBuf,
    pub num_samples: usize,
    pub seed: u32,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The gate refused a non-simulated mode. Nothing was synthesized or
    /// recorded.
    Rejected {
        run_id: String,
        run_dir: PathBuf,
        mode: String,
    },
    Finalized(RunBundle),
}

impl RunOutcome {
    pub fn run_dir(&self) -> &Path {
        match self {
            RunOutcome::Rejected { run_dir, .. } => run_dir,
            RunOutcome::Finalized(bundle) => &bundle.run_dir,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, RunOutcome::Rejected { .. })
    }
}

/// Run-level record written at finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub manifest: serde_json::Value,
    pub run_at: String,
    pub note: String,
}

/// `{experiment_id}_{UTC time to the second}`.
pub fn run_id(experiment_id: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}", experiment_id, at.format("%Y%m%dT%H%M%SZ"))
}

/// Derive the 32-bit synthesis seed from the manifest's `created_at` value.
///
/// Strings are hashed as their raw text, other values as their JSON
/// rendering, and an absent value as the empty string. BLAKE3 keeps the seed
/// identical across processes and platforms.
///
/// A value with no JSON rendering, such as a mapping with non-string keys,
/// is an `InvalidSpecification`.
pub fn derive_seed(created_at: Option<&serde_yaml::Value>) -> RunResult<u32> {
    let entropy = match created_at {
        None | Some(serde_yaml::Value::Null) => String::new(),
        Some(serde_yaml::Value::String(s)) => s.clone(),
        Some(other) => serde_json::to_string(other).map_err(|e| {
            RunError::InvalidSpecification(vec![format!(
                "created_at cannot be used as seed entropy: {}",
                e
            )])
        })?,
    };
    let digest = blake3::hash(entropy.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    Ok((u64::from_le_bytes(head) & 0xffff_ffff) as u32)
}

/// Translate a manifest into an engine spec writing into `run_dir`.
///
/// Tone frequencies are truncated to whole hertz, matching the compact tone
/// encoding used on the generator command line.
pub fn derive_signal_spec(manifest: &ExperimentManifest, run_dir: &Path) -> RunResult<SignalSpec> {
    let stimulus = &manifest.stimulus;
    let tones = stimulus
        .tones
        .iter()
        .map(|t| Tone::new(t.freq_hz.trunc(), t.amp));

    let mut spec = SignalSpec::new(
        manifest.capture.duration_s,
        manifest.capture.samplerate_hz,
        run_dir.join(&stimulus.simulated_iq_file),
    )
    .with_tones(tones)
    .with_noise(stimulus.noise_sigma)
    .with_seed(derive_seed(manifest.created_at.as_ref())?);

    if let Some(burst) = stimulus.burst {
        spec = spec.with_burst(burst);
    }
    Ok(spec)
}

/// Drives manifests through the run state machine.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: RunConfig,
}

impl Orchestrator {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Load a manifest file and run it to completion.
    pub fn run_file(&self, manifest_path: impl AsRef<Path>) -> RunResult<RunOutcome> {
        let manifest = ExperimentManifest::load(manifest_path)?;
        self.run(manifest, Utc::now())
    }

    /// Run a manifest, using `now` for the run identity.
    pub fn run(&self, manifest: ExperimentManifest, now: DateTime<Utc>) -> RunResult<RunOutcome> {
        let mut run = self.load(manifest, now)?;
        let span = tracing::info_span!("run", run_id = %run.run_id);
        let _enter = span.enter();

        if !self.gate(&mut run) {
            return Ok(RunOutcome::Rejected {
                mode: run.manifest.capture.mode.to_string(),
                run_id: run.run_id,
                run_dir: run.run_dir,
            });
        }

        let capture = self.synthesize(&mut run)?;
        let bundle = self.finalize(&mut run, &capture)?;
        Ok(RunOutcome::Finalized(bundle))
    }

    /// `→ Loaded`: derive the run identity and create the run directory.
    pub fn load(&self, manifest: ExperimentManifest, now: DateTime<Utc>) -> RunResult<PendingRun> {
        let run_id = run_id(&manifest.experiment_id, now);
        let run_dir = self.config.outdir.join(&run_id);
        fs::create_dir_all(&run_dir).map_err(|e| RunError::io(&run_dir, e))?;

        tracing::info!(run_id = %run_id, run_dir = %run_dir.display(), "Loaded manifest");
        Ok(PendingRun {
            run_id,
            run_dir,
            manifest,
            state: RunState::Loaded,
        })
    }

    /// `Loaded → Gated | Rejected`. Returns whether the run may proceed.
    pub fn gate(&self, run: &mut PendingRun) -> bool {
        let mode = &run.manifest.capture.mode;
        if mode.is_simulated() || self.config.allow_real_capture {
            if !mode.is_simulated() {
                tracing::warn!(mode = %mode, "Non-simulated mode allowed by operator override");
            }
            run.state = RunState::Gated;
            true
        } else {
            tracing::warn!(mode = %mode, "Rejected non-simulated run without override");
            run.state = RunState::Rejected;
            false
        }
    }

    /// `Gated → Synthesizing`: generate the capture inside the run directory.
    pub fn synthesize(&self, run: &mut PendingRun) -> RunResult<Capture> {
        run.state = RunState::Synthesizing;
        if let CaptureMode::Other(mode) = &run.manifest.capture.mode {
            tracing::error!(mode = %mode, "No real capture implementation");
            return Err(RunError::NotImplemented { mode: mode.clone() });
        }

        let spec = derive_signal_spec(&run.manifest, &run.run_dir)?;
        tracing::info!(
            out = %spec.output_path.display(),
            seed = spec.seed,
            "Running simulated generator"
        );
        Ok(synth::generate(&spec)?)
    }

    /// `Synthesizing → Finalized`: gather the sidecar and write the run record.
    pub fn finalize(&self, run: &mut PendingRun, capture: &Capture) -> RunResult<RunBundle> {
        let sidecar_path = self.collect_sidecar(&run.run_dir, &capture.sidecar_path)?;

        let record = RunMetadata {
            manifest: run.manifest.document.clone(),
            run_at: iso_timestamp(Utc::now()),
            note: RUN_NOTE.to_string(),
        };
        let metadata_path = run.run_dir.join(RUN_METADATA_FILE);
        write_json(&metadata_path, &record)?;

        run.state = RunState::Finalized;
        tracing::info!(run_dir = %run.run_dir.display(), "Run finalized");

        Ok(RunBundle {
            run_id: run.run_id.clone(),
            run_dir: run.run_dir.clone(),
            artifact_path: capture.artifact_path.clone(),
            sidecar_path,
            metadata_path,
            num_samples: capture.samples.len(),
            seed: capture.metadata.seed,
        })
    }

    /// Make sure the sidecar sits directly in the run directory, copying it
    /// up when the artifact was written to a subdirectory.
    fn collect_sidecar(&self, run_dir: &Path, sidecar: &Path) -> RunResult<Option<PathBuf>> {
        if !sidecar.exists() {
            return Ok(None);
        }
        let Some(name) = sidecar.file_name() else {
            return Ok(None);
        };
        let dest = run_dir.join(name);
        if dest != sidecar {
            fs::copy(sidecar, &dest).map_err(|e| RunError::io(&dest, e))?;
        }
        Ok(Some(dest))
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RunResult<()> {
    let file = File::create(path).map_err(|e| RunError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| RunError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use iqlab_core::io::read_artifact;
    use iqlab_core::GenerationMetadata;
    use tempfile::TempDir;

    fn manifest(mode: &str, extra_stimulus: &str) -> ExperimentManifest {
        ExperimentManifest::parse(&format!(
            r#"
experiment_id: bench
created_at: "2026-10-18T09:00:00Z"
capture_parameters:
  duration_s: 0.01
  samplerate_hz: 100000
  mode: {mode}
stimulus:
  tones:
    - {{ freq_hz: 10000.7, amp: 0.8 }}
  {extra_stimulus}
"#
        ))
        .unwrap()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 5).unwrap()
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_run_id_format() {
        assert_eq!(run_id("bench", at()), "bench_20261018T093005Z");
    }

    #[test]
    fn test_seed_is_stable_and_sensitive() {
        let a = serde_yaml::Value::String("2026-10-18T09:00:00Z".into());
        let b = serde_yaml::Value::String("2026-10-18T09:00:01Z".into());
        assert_eq!(derive_seed(Some(&a)).unwrap(), derive_seed(Some(&a)).unwrap());
        assert_ne!(derive_seed(Some(&a)).unwrap(), derive_seed(Some(&b)).unwrap());
        assert_eq!(
            derive_seed(None).unwrap(),
            derive_seed(Some(&serde_yaml::Value::Null)).unwrap()
        );
        // BLAKE3 of the empty string starts af 13 49 b9
        assert_eq!(derive_seed(None).unwrap(), 0xb949_13af);

        let numeric = serde_yaml::Value::from(20261018);
        assert_ne!(derive_seed(Some(&numeric)).unwrap(), derive_seed(None).unwrap());
    }

    #[test]
    fn test_unrenderable_created_at_is_rejected() {
        // JSON object keys must be strings
        let mut map = serde_yaml::Mapping::new();
        map.insert(
            serde_yaml::Value::Sequence(vec![1.into(), 2.into()]),
            "x".into(),
        );
        let created_at = serde_yaml::Value::Mapping(map);
        let err = derive_seed(Some(&created_at)).unwrap_err();
        assert!(
            matches!(err, RunError::InvalidSpecification(ref v) if v[0].contains("created_at"))
        );

        let temp_dir = TempDir::new().unwrap();
        let orch = Orchestrator::new(RunConfig::new(temp_dir.path()));
        let mut m = manifest("simulated", "");
        m.created_at = Some(created_at);
        let err = orch.run(m, at()).unwrap_err();
        assert!(matches!(err, RunError::InvalidSpecification(_)));
    }

    #[test]
    fn test_derive_signal_spec() {
        let m = manifest("simulated", "burst: { start_s: 0.002 }");
        let spec = derive_signal_spec(&m, Path::new("runs/x")).unwrap();
        assert_eq!(spec.tones, vec![Tone::new(10000.0, 0.8)]);
        assert_eq!(spec.burst_spec(), "0.002:0.05:5000");
        assert_eq!(spec.output_path, PathBuf::from("runs/x/capture.iq"));
        assert_eq!(spec.seed, derive_seed(m.created_at.as_ref()).unwrap());
        assert_eq!(spec.num_samples(), Some(1000));
    }

    #[test]
    fn test_simulated_run_produces_bundle() {
        let temp_dir = TempDir::new().unwrap();
        let orch = Orchestrator::new(RunConfig::new(temp_dir.path()));

        let outcome = orch.run(manifest("simulated", "noise_sigma: 0.01"), at()).unwrap();
        let RunOutcome::Finalized(bundle) = outcome else {
            panic!("expected finalized run");
        };

        assert_eq!(bundle.run_dir, temp_dir.path().join("bench_20261018T093005Z"));
        assert_eq!(
            files_in(&bundle.run_dir),
            vec!["capture.iq", "capture.iq.meta.json", RUN_METADATA_FILE]
        );
        assert_eq!(bundle.num_samples, 1000);
        assert_eq!(read_artifact(&bundle.artifact_path).unwrap().len(), 1000);

        let record: RunMetadata =
            serde_json::from_str(&fs::read_to_string(&bundle.metadata_path).unwrap()).unwrap();
        assert_eq!(record.note, RUN_NOTE);
        assert_eq!(record.manifest["experiment_id"], "bench");
        assert!(record.run_at.ends_with('Z'));

        let meta = GenerationMetadata::read(bundle.sidecar_path.unwrap()).unwrap();
        assert_eq!(meta.seed, bundle.seed);
        assert_eq!(meta.noise_sigma, 0.01);
    }

    #[test]
    fn test_rejected_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let orch = Orchestrator::new(RunConfig::new(temp_dir.path()));

        let outcome = orch.run(manifest("real", ""), at()).unwrap();
        assert!(outcome.is_rejected());
        assert!(outcome.run_dir().is_dir());
        assert!(files_in(outcome.run_dir()).is_empty());
    }

    #[test]
    fn test_override_reaches_not_implemented() {
        let temp_dir = TempDir::new().unwrap();
        let orch = Orchestrator::new(
            RunConfig::new(temp_dir.path()).with_real_capture_override(true),
        );

        let mut run = orch.load(manifest("real", ""), at()).unwrap();
        assert_eq!(run.state, RunState::Loaded);
        assert!(orch.gate(&mut run));
        assert_eq!(run.state, RunState::Gated);

        let err = orch.synthesize(&mut run).unwrap_err();
        assert!(matches!(err, RunError::NotImplemented { ref mode } if mode == "real"));
        assert_eq!(run.state, RunState::Synthesizing);
        assert!(files_in(&run.run_dir).is_empty());
    }

    #[test]
    fn test_override_value() {
        assert!(RunConfig::override_from(Some("1")));
        assert!(!RunConfig::override_from(Some("true")));
        assert!(!RunConfig::override_from(Some("01")));
        assert!(!RunConfig::override_from(Some("")));
        assert!(!RunConfig::override_from(None));
    }

    #[test]
    fn test_sidecar_copied_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        let orch = Orchestrator::new(RunConfig::new(temp_dir.path()));

        let outcome = orch
            .run(manifest("simulated", "simulated_iq_file: iq/cap.npy"), at())
            .unwrap();
        let RunOutcome::Finalized(bundle) = outcome else {
            panic!("expected finalized run");
        };
        assert!(bundle.run_dir.join("iq/cap.npy").exists());
        assert!(bundle.run_dir.join("iq/cap.npy.meta.json").exists());
        assert_eq!(bundle.sidecar_path, Some(bundle.run_dir.join("cap.npy.meta.json")));
        assert!(bundle.run_dir.join("cap.npy.meta.json").exists());
    }

    #[test]
    fn test_same_manifest_same_bytes() {
        let temp_a = TempDir::new().unwrap();
        let temp_b = TempDir::new().unwrap();
        let m = manifest("simulated", "noise_sigma: 0.2");

        let a = Orchestrator::new(RunConfig::new(temp_a.path())).run(m.clone(), at()).unwrap();
        let b = Orchestrator::new(RunConfig::new(temp_b.path())).run(m, at()).unwrap();
        let (RunOutcome::Finalized(a), RunOutcome::Finalized(b)) = (a, b) else {
            panic!("expected finalized runs");
        };
        assert_eq!(fs::read(a.artifact_path).unwrap(), fs::read(b.artifact_path).unwrap());
    }
}
