// src/forge/source.rs

//! Source acquisition
//!
//! Clones the upstream module repository at tag `v<version>`. There is no
//! re-clone or update logic: each build is expected to start from a fresh
//! work directory, and an already-present checkout is reused as-is.

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Clone `url` at tag `v<version>` into `dest`
pub fn acquire(url: &str, version: &str, dest: &Path) -> Result<()> {
    if dest.exists() {
        warn!(
            "Source folder {} already exists, reusing it without update",
            dest.display()
        );
        return Ok(());
    }

    let tag = format!("v{}", version);
    info!("Cloning {} at {} into {}", url, tag, dest.display());

    let output = Command::new("git")
        .arg("clone")
        .arg("--depth")
        .arg("1")
        .arg("--branch")
        .arg(&tag)
        .arg(url)
        .arg(dest)
        .output()
        .map_err(|e| Error::ToolNotFound(format!("Failed to run git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::CommandFailed(format!(
            "git clone of {} at {} failed with exit code {:?}\nstderr: {}",
            url,
            tag,
            output.status.code(),
            stderr
        )));
    }

    Ok(())
}
