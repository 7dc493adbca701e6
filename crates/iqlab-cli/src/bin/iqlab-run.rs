use clap::Parser;
use iqlab_cli::commands::run::{execute, RunArgs};
use std::process::ExitCode;

fn main() -> ExitCode {
    iqlab_cli::finish(execute(RunArgs::parse()))
}
