fn main() {
    // Best-effort: embed the git commit hash in `--version` output.
    let pkg = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .filter(|hash| !hash.is_empty());
    match hash {
        Some(hash) => {
            println!("cargo:rustc-env=GIT_COMMIT_HASH={hash}");
            println!("cargo:rustc-env=SQ_AUTOPILOT_LONG_VERSION={pkg} ({hash})");
        }
        None => println!("cargo:rustc-env=SQ_AUTOPILOT_LONG_VERSION={pkg}"),
    }
}
