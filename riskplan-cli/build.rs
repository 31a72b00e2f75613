// Injects the version string shown by `riskplan --version`.
//
// Uses `git describe` when building from a checkout and falls back to the
// package version otherwise (crates.io tarballs, no git on PATH).

use std::process::Command;

fn main() {
    let version = git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=RISKPLAN_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

fn git_version() -> Option<String> {
    // "v0.3.0", "v0.3.0-5-gabc123", "v0.3.0-5-gabc123-dirty" or a bare "abc123[-dirty]"
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();

    match described.strip_prefix('v') {
        Some(tagged) => {
            // keep only the tag part of "0.3.0-5-gabc123"
            let tag = tagged.split('-').next().unwrap_or(tagged);
            Some(tag.to_string())
        }
        None => {
            let base = env!("CARGO_PKG_VERSION");
            Some(format!("{}-{}", base, described))
        }
    }
}
