use std::process::ExitCode;

use clap::Parser;
use sq_autopilot_lib::args::Cli;

fn main() -> ExitCode {
    sq_autopilot_lib::run(Cli::parse())
}
