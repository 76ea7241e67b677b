use std::fs;
use std::path::Path;

use clap::Parser;
use pretty_assertions::assert_eq;
use sq_autopilot_lib::args::Cli;
use sq_autopilot_lib::commands::Exit;
use sq_autopilot_lib::{execute, render};

fn cli(runs_dir: &Path, args: &[&str]) -> Cli {
    let mut argv = vec!["sq-autopilot", "--quiet", "--runs-dir"];
    let dir = runs_dir.to_str().expect("utf-8 temp path");
    argv.push(dir);
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("cli should parse")
}

fn fixture(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, text).expect("write fixture");
    path.to_str().expect("utf-8 temp path").to_string()
}

#[test]
fn full_flow_maps_outcomes_to_exit_codes() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let runs_dir = tmp.path().join("runs");
    let questionnaire = fixture(
        tmp.path(),
        "questionnaire.csv",
        "question_id,question\nQ1,Is MFA enforced for admins?\nQ2,How often are backups restored?\n",
    );
    let policy = fixture(tmp.path(), "policy.md", "MFA is enforced for all admins.\n");
    let ops = fixture(tmp.path(), "ops.txt", "Backups are restored monthly in a drill.\n");

    let ingest = execute(&cli(
        &runs_dir,
        &["ingest", "--run-id", "acme", "--questionnaire", questionnaire.as_str(), "--sources", policy.as_str(), ops.as_str()],
    ))
    .expect("ingest");
    assert_eq!(ingest.exit, Exit::Completed);
    assert_eq!(ingest.json["chunk_count"], 2);

    let err = execute(&cli(
        &runs_dir,
        &["ingest", "--run-id", "acme", "--questionnaire", questionnaire.as_str(), "--sources", policy.as_str()],
    ))
    .unwrap_err();
    assert_eq!(err.code, "RUN_ALREADY_EXISTS");

    let draft = execute(&cli(&runs_dir, &["draft", "--run-id", "acme"])).expect("draft");
    assert_eq!(draft.exit, Exit::Completed);
    assert_eq!(draft.json["completed"], true);

    let decisions = fixture(
        tmp.path(),
        "decisions.csv",
        "question_id,decision,notes\nQ1,approve,\nQ2,reject,stale drill\n",
    );
    let blocked = execute(&cli(
        &runs_dir,
        &["approve", "--run-id", "acme", "--reviewer", "Sam", "--decisions", decisions.as_str()],
    ))
    .expect("approve");
    assert_eq!(blocked.exit, Exit::Blocked);
    assert_eq!(blocked.exit.code(), 1);
    assert!(render(&blocked, false).contains("BLOCKED: rejected or unresolved decisions: Q2"));

    let zip_path = tmp.path().join("acme.zip");
    let zip = zip_path.to_str().expect("utf-8 temp path");
    let export = execute(&cli(&runs_dir, &["export", "--run-id", "acme", "--output", zip])).expect("export");
    assert_eq!(export.exit, Exit::Blocked);
    assert_eq!(export.json["blocks"][0]["reason"], "approval_missing");
    assert!(!zip_path.exists());

    let decisions = fixture(
        tmp.path(),
        "decisions.csv",
        "question_id,decision,notes\nQ1,approve,\nQ2,approved,\n",
    );
    let approved = execute(&cli(
        &runs_dir,
        &["approve", "--run-id", "acme", "--reviewer", "Sam", "--decisions", decisions.as_str()],
    ))
    .expect("approve");
    assert_eq!(approved.exit, Exit::Completed);

    let export = execute(&cli(&runs_dir, &["export", "--run-id", "acme", "--output", zip])).expect("export");
    assert_eq!(export.exit, Exit::Completed);
    assert!(zip_path.is_file());
    assert!(render(&export, false).starts_with("Export complete: "));

    let status = execute(&cli(&runs_dir, &["status", "--run-id", "acme", "--json"])).expect("status");
    assert_eq!(status.json["stage"], "exported");
    assert_eq!(status.json["reviewer"], "Sam");
}

#[test]
fn fatal_errors_render_as_structured_json() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let err = execute(&cli(tmp.path(), &["draft", "--run-id", "missing"])).unwrap_err();
    let report = sq_autopilot_lib::commands::error_report(&err);
    assert_eq!(report.exit.code(), 2);
    assert_eq!(report.json["error"]["code"], "RUN_NOT_FOUND");
    assert_eq!(report.json["error"]["kind"], "state_conflict");
    assert!(render(&report, false).starts_with("error: [RUN_NOT_FOUND]"));
}

#[test]
fn pilot_deal_verdict_sets_exit_status() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let ok = execute(&cli(
        tmp.path(),
        &[
            "validate-pilot-deal",
            "--onboarding-fee", "2000",
            "--monthly-fee", "1800",
            "--included-questionnaires", "12",
            "--overage-fee", "150",
            "--expected-questionnaires", "10",
            "--estimated-cogs-per-questionnaire", "40",
        ],
    ))
    .expect("validate");
    assert_eq!(ok.exit, Exit::Completed);
    assert_eq!(ok.json["approved"], true);
    assert_eq!(ok.json["projection"]["gross_margin"], 0.7778);

    let low = execute(&cli(
        tmp.path(),
        &[
            "validate-pilot-deal",
            "--onboarding-fee", "1000",
            "--monthly-fee", "1800",
            "--included-questionnaires", "12",
            "--overage-fee", "150",
            "--expected-questionnaires", "10",
            "--estimated-cogs-per-questionnaire", "40",
        ],
    ))
    .expect("validate");
    assert_eq!(low.exit, Exit::Blocked);
    assert_eq!(low.json["issues"][0], "Onboarding fee below floor ($2000).");
    // Pricing output is JSON even without --json.
    let text: serde_json::Value = serde_json::from_str(&render(&low, false)).expect("json text");
    assert_eq!(text["approved"], false);
}
