//! Build script for dopo-web
//!
//! Stamps the binary with the identity reported by `/health` and the
//! startup banner: commit, whether the tree was dirty, UTC build time and
//! cargo profile.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string())
}

fn main() {
    // "abc12345", "abc12345-dirty", or "unknown" outside a checkout
    let git_hash = match git(&["rev-parse", "--short=8", "HEAD"]) {
        Some(hash) => match git(&["status", "--porcelain", "--untracked-files=no"]) {
            Some(changes) if !changes.is_empty() => format!("{}-dirty", hash),
            _ => hash,
        },
        None => "unknown".to_string(),
    };

    // e.g. 2025-10-26T19:30:45Z
    let build_timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
    // The repository root sits one level above this crate
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}
