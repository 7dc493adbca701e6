//! `iqlab-survey`: log placeholder spectrum snapshots.

use crate::{init_tracing, load_config, CliResult};
use clap::Parser;
use iqlab_core::observe::LogLevel;
use iqlab_core::SurveyConfig;
use iqlab_sim::SpectralSurvey;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "iqlab-survey")]
#[command(about = "Record passive spectrum snapshots for a local, benign survey", long_about = None)]
#[command(version)]
pub struct SurveyArgs {
    /// Configuration file (overrides the search path)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory receiving snapshot files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Device identifier recorded in every file
    #[arg(long)]
    pub device_id: Option<String>,

    /// Number of snapshots to take
    #[arg(long)]
    pub snapshots: Option<usize>,

    /// Seconds between snapshots
    #[arg(long)]
    pub interval_secs: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<LogLevel>,
}

impl SurveyArgs {
    /// Apply command-line overrides on top of the configured survey.
    pub fn apply(&self, mut survey: SurveyConfig) -> SurveyConfig {
        if let Some(dir) = &self.output_dir {
            survey.output_dir = dir.clone();
        }
        if let Some(id) = &self.device_id {
            survey.device_id = id.clone();
        }
        if let Some(n) = self.snapshots {
            survey.num_snapshots = n;
        }
        if let Some(secs) = self.interval_secs {
            survey.snapshot_interval_secs = secs;
        }
        survey
    }
}

pub fn execute(args: SurveyArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    init_tracing(&config, args.log_level);

    let survey = SpectralSurvey::new(args.apply(config.survey.clone()))?;
    let report = survey.run()?;

    for path in &report.snapshots {
        println!("[+] Saved snapshot: {}", path.display());
    }
    println!("[+] Survey complete. Remember: anonymize before publishing.");
    Ok(())
}
