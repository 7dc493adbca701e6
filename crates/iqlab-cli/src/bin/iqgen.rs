use clap::Parser;
use iqlab_cli::commands::iqgen::{execute, IqgenArgs};
use std::process::ExitCode;

fn main() -> ExitCode {
    iqlab_cli::finish(execute(IqgenArgs::parse()))
}
