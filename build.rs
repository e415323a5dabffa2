// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=TACTILE_PICTURE_VERSION");

    // Packagers can pin the version string explicitly
    let version = if let Ok(v) = std::env::var("TACTILE_PICTURE_VERSION") {
        v
    } else {
        get_git_version()
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

fn get_git_version() -> String {
    let package_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into());

    let Some(commit_hash) = get_commit_hash() else {
        return package_version;
    };

    // "v0.1.0" at a tag, "v0.1.0-5-gabcdef1" after it
    let described = Command::new("git")
        .args(["describe", "--tags", "--match", "v*"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string());

    match described {
        Some(tag) => {
            let tag = tag.strip_prefix('v').unwrap_or(&tag);
            let parts: Vec<&str> = tag.rsplitn(3, '-').collect();
            if parts.len() >= 3 {
                format!("{}-dirty-{}", parts[2], commit_hash)
            } else {
                format!("{}-{}", tag, commit_hash)
            }
        }
        None => format!("{}-{}", package_version, commit_hash),
    }
}

fn get_commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
