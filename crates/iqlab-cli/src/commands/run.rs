//! `iqlab-run`: execute an experiment manifest.

use crate::{init_tracing, load_config, CliResult};
use clap::Parser;
use iqlab_core::observe::LogLevel;
use iqlab_sim::orchestrator::ALLOW_REAL_CAPTURE_ENV;
use iqlab_sim::{Orchestrator, RunConfig, RunOutcome};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "iqlab-run")]
#[command(about = "Run an experiment manifest behind the real-capture safety gate", long_about = None)]
#[command(version)]
pub struct RunArgs {
    /// Experiment manifest (YAML)
    #[arg(long)]
    pub manifest: PathBuf,

    /// Parent directory for run bundles [default: run.outdir from config, else "runs"]
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Configuration file (overrides the search path)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<LogLevel>,
}

impl RunArgs {
    /// Orchestrator settings. `allow_real_capture` is the raw value of the
    /// `ALLOW_REAL_CAPTURE` environment variable.
    pub fn run_config(
        &self,
        default_outdir: PathBuf,
        allow_real_capture: Option<&str>,
    ) -> RunConfig {
        RunConfig::new(self.outdir.clone().unwrap_or(default_outdir))
            .with_real_capture_override(RunConfig::override_from(allow_real_capture))
    }
}

pub fn execute(args: RunArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    init_tracing(&config, args.log_level);

    let allow_real_capture = std::env::var(ALLOW_REAL_CAPTURE_ENV).ok();
    let orchestrator = Orchestrator::new(
        args.run_config(config.run.outdir.clone(), allow_real_capture.as_deref()),
    );
    match orchestrator.run_file(&args.manifest)? {
        RunOutcome::Rejected { mode, .. } => {
            println!(
                "[!] Manifest mode is '{}', not 'simulated'. Set ALLOW_REAL_CAPTURE=1 to proceed with real hardware captures.",
                mode
            );
        }
        RunOutcome::Finalized(bundle) => {
            println!("[+] Simulated IQ written to {}", bundle.artifact_path.display());
            println!("[+] Run outputs saved in {}", bundle.run_dir.display());
            println!(
                "[!] Reminder: this run used simulated IQ; do not transmit these files over the air outside of shielded, authorized environments."
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outdir_falls_back_to_config() {
        let args = RunArgs::try_parse_from(["iqlab-run", "--manifest", "m.yaml"]).unwrap();
        assert_eq!(
            args.run_config(PathBuf::from("labruns"), None).outdir,
            PathBuf::from("labruns")
        );

        let args =
            RunArgs::try_parse_from(["iqlab-run", "--manifest", "m.yaml", "--outdir", "elsewhere"])
                .unwrap();
        assert_eq!(
            args.run_config(PathBuf::from("labruns"), None).outdir,
            PathBuf::from("elsewhere")
        );
    }

    #[test]
    fn test_override_needs_exact_one() {
        let args = RunArgs::try_parse_from(["iqlab-run", "--manifest", "m.yaml"]).unwrap();
        for (value, expected) in [
            (Some("1"), true),
            (Some("true"), false),
            (Some("yes"), false),
            (Some("0"), false),
            (None, false),
        ] {
            let config = args.run_config(PathBuf::from("runs"), value);
            assert_eq!(config.allow_real_capture, expected, "{:?}", value);
        }
    }

    #[test]
    fn test_no_command_line_override() {
        let parsed = RunArgs::try_parse_from([
            "iqlab-run",
            "--manifest",
            "m.yaml",
            "--allow-real-capture",
            "1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_manifest_required() {
        assert!(RunArgs::try_parse_from(["iqlab-run"]).is_err());
    }
}
