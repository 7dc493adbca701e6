//! `iqgen`: synthesize one simulated capture.

use crate::{init_tracing, load_config, CliResult};
use clap::Parser;
use iqlab_core::observe::LogLevel;
use iqlab_core::spec::{encode_tones, parse_tones};
use iqlab_core::{synth, BurstSpec, SignalSpec, DEFAULT_SEED};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "iqgen")]
#[command(about = "Generate simulated IQ for contained lab analysis", long_about = None)]
#[command(version)]
pub struct IqgenArgs {
    /// Capture length in seconds
    #[arg(long, default_value_t = 5.0)]
    pub duration: f64,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 2e6)]
    pub samplerate: f64,

    /// Comma separated freq:amp list, e.g. 100e3:0.8,300e3:0.5
    #[arg(long, default_value = "")]
    pub tones: String,

    /// Complex noise sigma
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Burst as start:duration:rate, e.g. 0.2:0.05:5
    #[arg(long, default_value = "")]
    pub burst: String,

    /// Output file (.npy for NumPy complex64, anything else for raw cf32)
    #[arg(long)]
    pub out: PathBuf,

    /// Noise seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u32,

    /// Configuration file (overrides the search path)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<LogLevel>,
}

impl IqgenArgs {
    /// Build the signal spec these arguments describe.
    pub fn signal_spec(&self) -> CliResult<SignalSpec> {
        let mut spec = SignalSpec::new(self.duration, self.samplerate, &self.out)
            .with_tones(parse_tones(&self.tones)?)
            .with_noise(self.noise)
            .with_seed(self.seed);
        if let Some(burst) = BurstSpec::parse(&self.burst)? {
            spec = spec.with_burst(burst);
        }
        Ok(spec.with_burst_token(self.burst.as_str()))
    }
}

pub fn execute(args: IqgenArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    init_tracing(&config, args.log_level);

    let spec = args.signal_spec()?;
    let capture = synth::generate(&spec)?;

    println!(
        "[+] Wrote {} and metadata {}",
        capture.artifact_path.display(),
        capture.sidecar_path.display()
    );
    println!(
        "[+] Preview: tones=[{}], noise_sigma={}, burst={}",
        encode_tones(&capture.metadata.tones),
        capture.metadata.noise_sigma,
        capture.metadata.burst_spec
    );
    println!("[!] Reminder: this is simulated IQ data for contained lab use only");
    Ok(())
}
