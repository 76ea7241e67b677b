use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Security questionnaire autopilot: ingest, draft, approve, export.
#[derive(Debug, Parser)]
#[command(
    name = "sq-autopilot",
    version,
    long_version = env!("SQ_AUTOPILOT_LONG_VERSION"),
    about = "Citation-grounded security questionnaire drafting with mandatory human approval"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding one subdirectory per run (overrides config and env)
    #[arg(long, global = true, value_name = "DIR")]
    pub runs_dir: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Errors only on stderr
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a run from a questionnaire CSV and evidence files
    Ingest(IngestArgs),
    /// Draft cited answers for every question in a run
    Draft(RunArgs),
    /// Record reviewer decisions; writes approval only if every question is approved
    Approve(ApproveArgs),
    /// Build the export package and zip it
    Export(ExportArgs),
    /// Show a run's stage, counts and gate flags
    Status(RunArgs),
    /// Check pilot deal economics against the pricing floor
    ValidatePilotDeal(DealArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long)]
    pub run_id: String,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(long)]
    pub run_id: String,
    #[arg(long, value_name = "CSV")]
    pub questionnaire: PathBuf,
    /// Evidence files (.md, .txt, .csv), ingested in the order given
    #[arg(long, value_name = "FILE", required = true, num_args = 1..)]
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ApproveArgs {
    #[arg(long)]
    pub run_id: String,
    #[arg(long)]
    pub reviewer: String,
    /// CSV with question_id,decision,notes
    #[arg(long, value_name = "CSV")]
    pub decisions: PathBuf,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(long)]
    pub run_id: String,
    #[arg(long, value_name = "ZIP")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct DealArgs {
    #[arg(long)]
    pub onboarding_fee: f64,
    #[arg(long)]
    pub monthly_fee: f64,
    #[arg(long)]
    pub included_questionnaires: u32,
    #[arg(long)]
    pub overage_fee: f64,
    #[arg(long)]
    pub expected_questionnaires: u32,
    #[arg(long)]
    pub estimated_cogs_per_questionnaire: f64,
}
