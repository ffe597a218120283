// src/version.rs

//! Module version resolution
//!
//! The version of a module recipe is taken from, in order:
//! 1. the `QTFORGE_VERSION` override environment variable,
//! 2. the git ref of the recipe's own folder (branch name, falling back to
//!    `git describe --tags`).
//!
//! The raw ref is normalized: only the text after the last `/` is kept
//! (branch names like `release/v5.15.2`) and a leading `v` before a digit is
//! stripped. Failing to determine any ref is a fatal error.

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Environment variable that overrides git-based version detection
pub const VERSION_OVERRIDE_ENV: &str = "QTFORGE_VERSION";

/// Resolve the version for a recipe located in `recipe_dir`
pub fn resolve_version(recipe_dir: &Path) -> Result<String> {
    if let Ok(raw) = std::env::var(VERSION_OVERRIDE_ENV) {
        let raw = raw.trim();
        if !raw.is_empty() {
            debug!("Version from {}: {}", VERSION_OVERRIDE_ENV, raw);
            return normalize_ref(raw);
        }
    }

    let raw = git_ref(recipe_dir)?;
    debug!("Version from git ref of {}: {}", recipe_dir.display(), raw);
    normalize_ref(&raw)
}

/// Normalize a git ref or tag into a version string
///
/// `release/v5.15.2` and `v5.15.2` both become `5.15.2`. The result is
/// validated with semver when it looks like a dotted version; non-semver
/// refs are accepted verbatim after prefix stripping.
pub fn normalize_ref(raw: &str) -> Result<String> {
    let tail = raw.rsplit('/').next().unwrap_or(raw).trim();

    let version = match tail.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => tail,
    };

    if version.is_empty() {
        return Err(Error::VersionError(format!(
            "Cannot derive a version from ref '{}'",
            raw
        )));
    }

    if semver::Version::parse(version).is_err() {
        debug!("Version '{}' is not semver, using it verbatim", version);
    }

    Ok(version.to_string())
}

/// Ask git for the current ref of `dir`
fn git_ref(dir: &Path) -> Result<String> {
    // Branch name first, then nearest tag for detached checkouts
    if let Some(branch) = run_git(dir, &["symbolic-ref", "--short", "-q", "HEAD"])? {
        return Ok(branch);
    }
    if let Some(tag) = run_git(dir, &["describe", "--tags", "--abbrev=0"])? {
        return Ok(tag);
    }

    Err(Error::VersionError(format!(
        "No git ref found for {} and {} is not set",
        dir.display(),
        VERSION_OVERRIDE_ENV
    )))
}

fn run_git(dir: &Path, args: &[&str]) -> Result<Option<String>> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::ToolNotFound(format!("Failed to run git: {}", e)))?;

    if !output.status.success() {
        return Ok(None);
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}
