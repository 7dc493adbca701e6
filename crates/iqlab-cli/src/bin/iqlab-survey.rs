use clap::Parser;
use iqlab_cli::commands::survey::{execute, SurveyArgs};
use std::process::ExitCode;

fn main() -> ExitCode {
    iqlab_cli::finish(execute(SurveyArgs::parse()))
}
