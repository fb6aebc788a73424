use std::env;
use std::process::Command;

/// Output of `git <args>`, falling back to the `fallback` env var (container
/// builds have no .git directory).
fn git(args: &[&str], fallback: &str) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| env::var(fallback).ok())
}

fn main() {
    let git_hash = git(&["rev-parse", "--short", "HEAD"], "GIT_HASH");
    let git_branch = git(&["rev-parse", "--abbrev-ref", "HEAD"], "GIT_BRANCH");

    let build_timestamp = chrono::Utc::now().to_rfc3339();
    let rust_version = rustc_version::version()
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    for (key, value) in [
        ("GIT_HASH", git_hash.unwrap_or_else(|| "unknown".into())),
        ("GIT_BRANCH", git_branch.unwrap_or_else(|| "unknown".into())),
        ("BUILD_TIMESTAMP", build_timestamp),
        ("RUST_VERSION", rust_version),
    ] {
        println!("cargo:rustc-env={}={}", key, value);
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=GIT_HASH");
    println!("cargo:rerun-if-env-changed=GIT_BRANCH");
}
