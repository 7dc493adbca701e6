//! # iqlab Simulation Runs
//!
//! Manifest-driven orchestration on top of [`iqlab_core`]:
//!
//! - [`manifest`]: typed experiment manifest with single-pass validation
//! - [`orchestrator`]: load → safety gate → synthesis → run bundle
//! - [`survey`]: passive spectral snapshot logger writing placeholder spectra
//!
//! ## Example
//!
//! ```rust,no_run
//! use iqlab_sim::orchestrator::{Orchestrator, RunConfig, RunOutcome};
//!
//! let orch = Orchestrator::new(RunConfig::new("runs"));
//! match orch.run_file("experiments/baseline.yaml").unwrap() {
//!     RunOutcome::Finalized(bundle) => println!("{}", bundle.run_dir.display()),
//!     RunOutcome::Rejected { mode, .. } => println!("refused mode {}", mode),
//! }
//! ```

pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod survey;

pub use error::{RunError, RunResult, SurveyError};
pub use manifest::{CaptureMode, ExperimentManifest};
pub use orchestrator::{Orchestrator, RunBundle, RunConfig, RunOutcome, RunState};
pub use survey::{SpectralSurvey, SurveyReport};
