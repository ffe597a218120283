// src/cache.rs

//! Local package cache
//!
//! Built packages live under `<root>/data/<name>/<version>/<id>/package`,
//! where `<id>` is a content-derived identity hashed over the recipe name,
//! version, settings and options. The cache root's directory name (by
//! default `.qtforge`) doubles as the sentinel marker the packager searches
//! for inside install trees, since `INSTALL_ROOT`-driven installs reproduce
//! the cache path inside the install scratch directory.

use crate::error::{Error, Result};
use crate::recipe::Recipe;
use crate::settings::Settings;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default cache directory name, also the install-tree sentinel marker
pub const CACHE_DIR_NAME: &str = ".qtforge";

/// Number of hex characters kept from the identity hash
const PACKAGE_ID_LEN: usize = 16;

/// Handle to the local package cache
#[derive(Debug, Clone)]
pub struct PackageCache {
    root: PathBuf,
}

impl PackageCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Default cache root: `~/.qtforge`, or `./.qtforge` without a home dir
    pub fn default_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CACHE_DIR_NAME)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sentinel path component used to locate nested install output
    pub fn marker(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| CACHE_DIR_NAME.to_string())
    }

    fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Content-derived package identity for a recipe run
    ///
    /// Hashed over name, version, settings and options so that two runs
    /// with different configurations never collide in the cache.
    pub fn package_id(recipe: &Recipe, version: &str, settings: &Settings) -> String {
        let mut hasher = Sha256::new();
        hasher.update(recipe.module.name.as_bytes());
        hasher.update(b"\n");
        hasher.update(version.as_bytes());
        hasher.update(b"\n");
        hasher.update(settings.os.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(settings.compiler.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(settings.build_type.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(if recipe.options.shared { b"shared" as &[u8] } else { b"static" });

        let digest = hasher.finalize();
        hex::encode(digest)[..PACKAGE_ID_LEN].to_string()
    }

    /// Final package directory for a recipe run, created if absent
    pub fn create_package_dir(&self, name: &str, version: &str, id: &str) -> Result<PathBuf> {
        let dir = self
            .data_dir()
            .join(name)
            .join(version)
            .join(id)
            .join("package");

        // A previous run's output is stale once we are rebuilding
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Find an existing package for `name`/`version`, any identity
    pub fn find_package(&self, name: &str, version: &str) -> Option<PathBuf> {
        let version_dir = self.data_dir().join(name).join(version);
        let entries = fs::read_dir(&version_dir).ok()?;

        for entry in entries.filter_map(|e| e.ok()) {
            let candidate = entry.path().join("package");
            if candidate.is_dir() {
                debug!("Found {}/{} at {}", name, version, candidate.display());
                return Some(candidate);
            }
        }
        None
    }

    /// Resolve the root of a required package, failing when it is missing
    pub fn require_package(&self, name: &str, version: &str) -> Result<PathBuf> {
        self.find_package(name, version).ok_or_else(|| {
            Error::ResolutionError(format!(
                "Required package {}/{} not found in cache {}",
                name,
                version,
                self.root.display()
            ))
        })
    }
}
