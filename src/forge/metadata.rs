// src/forge/metadata.rs

//! Package metadata export
//!
//! After packaging, the module publishes everything downstream consumers
//! need: link-library names (with the platform/config debug suffix), the
//! module's preprocessor define, include/bin/plugin/module-descriptor
//! directories, search-path and prefix-path entries, the per-module package
//! location variable, and the cmake discovery names. The same data is
//! serialized into the package as `qtforge-info.toml`.

use crate::error::{Error, Result};
use crate::recipe::Recipe;
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the serialized metadata inside the package
pub const INFO_FILE: &str = "qtforge-info.toml";

/// Exported metadata for one built package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Module name
    pub name: String,
    /// Library names consumers link against
    pub libs: Vec<String>,
    /// Preprocessor defines, e.g. `QT_SVG_LIB`
    pub defines: Vec<String>,
    /// Include directories
    pub include_dirs: Vec<PathBuf>,
    /// Entries appended to the executable search path
    pub bin_dirs: Vec<PathBuf>,
    /// Entries appended to the plugin search path
    pub plugin_dirs: Vec<PathBuf>,
    /// Entries appended to the qmake module search path
    pub module_dirs: Vec<PathBuf>,
    /// Entries appended to the build-system prefix path
    pub prefix_paths: Vec<PathBuf>,
    /// Environment variables published for downstream recipes
    pub env: BTreeMap<String, String>,
    /// Canonical name mapped into cmake's discovery mechanisms
    pub cmake_names: BTreeMap<String, String>,
}

/// Build the exported metadata for a packaged module
pub fn export(package_dir: &Path, recipe: &Recipe, settings: &Settings) -> Result<PackageInfo> {
    let suffix = settings.debug_suffix();

    let discovered = discover_libs(&package_dir.join("lib"));
    let libs = if discovered.is_empty() {
        // The canonical name never carries a suffix, so it always gets one
        vec![format!("{}{}", recipe.canonical_lib(), suffix)]
    } else {
        // On-disk names may already carry the suffix (debug builds install
        // suffixed artifacts); only then is appending skipped
        discovered
            .into_iter()
            .map(|name| {
                if !suffix.is_empty() && name.ends_with(suffix) {
                    name
                } else {
                    format!("{}{}", name, suffix)
                }
            })
            .collect()
    };

    let mut info = PackageInfo {
        name: recipe.module.name.clone(),
        libs,
        defines: vec![recipe.define_name()],
        include_dirs: discover_include_dirs(package_dir),
        bin_dirs: Vec::new(),
        plugin_dirs: Vec::new(),
        module_dirs: Vec::new(),
        prefix_paths: vec![package_dir.to_path_buf()],
        env: BTreeMap::new(),
        cmake_names: BTreeMap::new(),
    };

    let bin_dir = package_dir.join("bin");
    if bin_dir.is_dir() {
        info.bin_dirs.push(bin_dir);
    }
    let plugins_dir = package_dir.join("plugins");
    if plugins_dir.is_dir() {
        info.plugin_dirs.push(plugins_dir);
    }
    let modules_dir = package_dir.join("mkspecs").join("modules");
    if modules_dir.is_dir() {
        info.module_dirs.push(modules_dir);
    }

    info.env.insert(
        recipe.package_dir_var(),
        package_dir.to_string_lossy().to_string(),
    );

    let canonical = recipe.canonical_lib();
    info.cmake_names
        .insert("cmake_find_package".to_string(), canonical.clone());
    info.cmake_names
        .insert("cmake_find_package_multi".to_string(), canonical);

    Ok(info)
}

/// Serialize the metadata into the package directory
pub fn write_info(package_dir: &Path, info: &PackageInfo) -> Result<()> {
    let content = toml::to_string_pretty(info)
        .map_err(|e| Error::IoError(format!("Failed to serialize package info: {}", e)))?;
    fs::write(package_dir.join(INFO_FILE), content)?;
    Ok(())
}

/// Read serialized metadata back from a package directory
pub fn read_info(package_dir: &Path) -> Result<PackageInfo> {
    let path = package_dir.join(INFO_FILE);
    let content = fs::read_to_string(&path)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::ParseError(format!("Invalid package info: {}", e)))
}

/// Discover link-library base names from a packaged lib directory
///
/// `libQt5Svg.so.5.15.2`, `libQt5Svg.a`, `Qt5Svg.lib` and `Qt5Svg.dylib`
/// all yield `Qt5Svg`. Anything that is not a linkable artifact (`.prl`
/// metadata, pkgconfig, ...) is ignored.
fn discover_libs(lib_dir: &Path) -> Vec<String> {
    let mut names = BTreeSet::new();

    let entries = match fs::read_dir(lib_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();

        let linkable = [".so", ".a", ".dylib", ".lib"]
            .iter()
            .any(|ext| file_name.contains(ext));
        if !linkable || file_name.ends_with(".la") {
            continue;
        }

        let stem = file_name.split('.').next().unwrap_or(&file_name);
        let base = stem.strip_prefix("lib").unwrap_or(stem);
        if !base.is_empty() {
            names.insert(base.to_string());
        }
    }

    debug!("Discovered libs in {}: {:?}", lib_dir.display(), names);
    names.into_iter().collect()
}

/// Include directory plus its first-level subdirectories
///
/// Qt modules install headers under `include/<Module>/`, and consumers
/// expect both the umbrella dir and the module dirs on the include path.
fn discover_include_dirs(package_dir: &Path) -> Vec<PathBuf> {
    let include = package_dir.join("include");
    if !include.is_dir() {
        return Vec::new();
    }

    let mut dirs = vec![include.clone()];
    if let Ok(entries) = fs::read_dir(&include) {
        let mut subdirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        subdirs.sort();
        dirs.extend(subdirs);
    }
    dirs
}
