pub mod args;
pub mod commands;
pub mod config;

use std::process::ExitCode;

use sqa_core::error::AppError;
use sqa_core::normalize::timestamps::now_rfc3339_utc;
use sqa_core::run::RunStore;
use sqa_core::store::FsBlobStore;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command};
use crate::commands::{error_report, Report};
use crate::config::AppConfig;

/// Install the stderr subscriber. `--quiet` and `--verbose` override the configured directive.
pub fn init_tracing(directive: &str, quiet: bool, verbose: bool) -> Result<(), AppError> {
    let directive = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        directive
    };
    let filter = EnvFilter::try_new(directive).map_err(|e| {
        AppError::input("CONFIG_INVALID", "Invalid log directive")
            .with_details(format!("log={directive}; err={e}"))
    })?;
    // A subscriber may already be installed when embedded or under test.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

/// Execute one command against the configured runs directory.
pub fn execute(cli: &Cli) -> Result<Report, AppError> {
    let config = AppConfig::load(cli.runs_dir.as_deref())?;
    init_tracing(&config.log, cli.quiet, cli.verbose)?;
    tracing::debug!(runs_dir = %config.runs_dir.display(), "configuration loaded");

    let blobs = FsBlobStore::open(config.runs_dir.clone());
    let runs = RunStore::new(&blobs);
    let now = now_rfc3339_utc()?;
    match &cli.command {
        Command::Ingest(args) => commands::ingest(&runs, args, &now),
        Command::Draft(args) => commands::draft(&runs, args, &now),
        Command::Approve(args) => commands::approve(&runs, args, &now),
        Command::Export(args) => commands::export(&runs, args, &now),
        Command::Status(args) => commands::status(&runs, args),
        Command::ValidatePilotDeal(args) => commands::validate_pilot_deal(args),
    }
}

pub fn render(report: &Report, json: bool) -> String {
    if json {
        serde_json::to_string_pretty(&report.json).unwrap_or_else(|_| report.json.to_string())
    } else {
        report.lines.join("\n")
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let report = execute(&cli).unwrap_or_else(|err| error_report(&err));
    let out = render(&report, cli.json);
    if report.exit == commands::Exit::Fatal && !cli.json {
        eprintln!("{out}");
    } else {
        println!("{out}");
    }
    ExitCode::from(report.exit.code())
}
