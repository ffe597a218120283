// src/forge/package.rs

//! Packaging: relocate install output into the final package directory
//!
//! The native tool's install step nests output under
//! `<install>/<uncontrolled depth>/<marker>/<...>/{bin,include,lib,...}`,
//! because `INSTALL_ROOT` is spliced in front of the qt package's own cache
//! path. The packager finds the real prefix by searching for the cache
//! sentinel marker, copies the tree into the package (symlinks preserved),
//! strips superseded build-system integration files, and rewrites the
//! placeholder tokens in `.pri` module descriptors so the package stays
//! valid wherever the consumer's cache lives.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Placeholder for the module include base path in `.pri` files
pub const INCLUDE_BASE_TOKEN: &str = "$$QT_MODULE_INCLUDE_BASE";
/// Placeholder for the module lib base path in `.pri` files
pub const LIB_BASE_TOKEN: &str = "$$QT_MODULE_LIB_BASE";
/// Placeholder for the module bin base path in `.pri` files
pub const BIN_BASE_TOKEN: &str = "$$QT_MODULE_BIN_BASE";

/// Subdirectories copied from the discovered install prefix
const PREFIX_SUBDIRS: &[&str] = &["bin", "include", "lib", "plugins"];

/// Locate the real install prefix inside the install tree
///
/// Matches the first directory named `include` (or legacy `mkspecs`) that
/// has the sentinel `marker` as a path component somewhere above it; the
/// prefix is that directory's parent. The nesting depth is arbitrary.
pub fn find_install_prefix(install_dir: &Path, marker: &str) -> Result<PathBuf> {
    for entry in WalkDir::new(install_dir)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name();
        if name != "include" && name != "mkspecs" {
            continue;
        }

        let parent = match entry.path().parent() {
            Some(p) => p,
            None => continue,
        };
        let above = match parent.strip_prefix(install_dir) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if above.components().any(|c| c.as_os_str() == marker) {
            debug!("Install prefix: {}", parent.display());
            return Ok(parent.to_path_buf());
        }
    }

    Err(Error::NotFound(format!(
        "Cannot find installation directory: no '{}' marker above include/mkspecs in {}",
        marker,
        install_dir.display()
    )))
}

/// Copy a directory tree, preserving symbolic links
///
/// Missing sources are a no-op: not every module installs plugins or bin.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        return Ok(());
    }

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::IoError(e.to_string()))?;
        let target = dst.join(rel);

        if entry.path_is_symlink() {
            let link = fs::read_link(entry.path())?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            make_symlink(&link, &target)?;
        } else if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn make_symlink(link: &Path, target: &Path) -> Result<()> {
    if target.exists() || target.symlink_metadata().is_ok() {
        fs::remove_file(target)?;
    }
    std::os::unix::fs::symlink(link, target)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_symlink(link: &Path, target: &Path) -> Result<()> {
    // Symlink creation needs privileges on Windows; fall back to copying
    // the link target when it resolves, otherwise skip it.
    if let Some(parent) = target.parent() {
        let resolved = parent.join(link);
        if resolved.is_file() {
            fs::copy(&resolved, target)?;
        }
    }
    Ok(())
}

/// Assemble the final package from the install and build trees
pub fn assemble(
    install_dir: &Path,
    build_dir: &Path,
    package_dir: &Path,
    marker: &str,
    package_dir_var: &str,
) -> Result<()> {
    let prefix = find_install_prefix(install_dir, marker)?;

    for sub in PREFIX_SUBDIRS {
        copy_tree(&prefix.join(sub), &package_dir.join(sub))?;
    }

    // Forwarding .pri files are generated into the build tree, not the
    // install prefix, so mkspecs comes from the build directory.
    copy_tree(&build_dir.join("mkspecs"), &package_dir.join("mkspecs"))?;

    strip_artifacts(package_dir)?;
    rewrite_descriptors(package_dir, package_dir_var, &build_dir.to_string_lossy())?;

    info!("Packaged install tree into {}", package_dir.display());
    Ok(())
}

/// Remove superseded build-system integration files and debug artifacts
///
/// cmake find/config files are superseded by the exported package metadata;
/// libtool archives and debug-symbol files never belong in the package.
pub fn strip_artifacts(package_dir: &Path) -> Result<()> {
    let cmake_dir = package_dir.join("lib").join("cmake");
    if cmake_dir.is_dir() {
        debug!("Stripping {}", cmake_dir.display());
        fs::remove_dir_all(&cmake_dir)?;
    }

    let mut files = Vec::new();
    let mut dirs = Vec::new();

    for root in ["lib", "bin"] {
        let root = package_dir.join(root);
        if !root.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type().is_dir() {
                if name.ends_with(".dSYM") {
                    dirs.push(entry.path().to_path_buf());
                }
                continue;
            }
            let is_cmake_glue = name.ends_with(".cmake")
                && (name.starts_with("Find")
                    || name.ends_with("Config.cmake")
                    || name.ends_with("-config.cmake"));
            if is_cmake_glue
                || name.ends_with(".la")
                || name.ends_with(".pdb")
                || name.ends_with(".debug")
            {
                files.push(entry.path().to_path_buf());
            }
        }
    }

    for path in files {
        debug!("Stripping {}", path.display());
        fs::remove_file(&path)?;
    }
    for path in dirs {
        debug!("Stripping {}", path.display());
        fs::remove_dir_all(&path)?;
    }

    Ok(())
}

/// Rewrite placeholder tokens in one descriptor's content
///
/// Replaces the literal build-tree path and the three module base-path
/// placeholders with references to the per-module package location
/// variable. Every replacement is a no-op when its token is absent, and
/// the rewrite is idempotent.
pub fn rewrite_descriptor(content: &str, package_dir_var: &str, build_dir: &str) -> String {
    let var_ref = format!("$$({})", package_dir_var);

    let mut out = if build_dir.is_empty() {
        content.to_string()
    } else {
        content.replace(build_dir, &var_ref)
    };

    out = out.replace(INCLUDE_BASE_TOKEN, &format!("{}/include", var_ref));
    out = out.replace(LIB_BASE_TOKEN, &format!("{}/lib", var_ref));
    out = out.replace(BIN_BASE_TOKEN, &format!("{}/bin", var_ref));
    out
}

/// Rewrite every `.pri` module descriptor under `<package>/mkspecs/modules`
pub fn rewrite_descriptors(
    package_dir: &Path,
    package_dir_var: &str,
    build_dir: &str,
) -> Result<()> {
    let modules_dir = package_dir.join("mkspecs").join("modules");
    if !modules_dir.is_dir() {
        return Ok(());
    }

    for entry in WalkDir::new(&modules_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) != Some("pri") {
            continue;
        }

        let content = match fs::read_to_string(entry.path()) {
            Ok(c) => c,
            Err(e) => {
                warn!("Skipping descriptor {}: {}", entry.path().display(), e);
                continue;
            }
        };

        let rewritten = rewrite_descriptor(&content, package_dir_var, build_dir);
        if rewritten != content {
            debug!("Rewrote descriptor {}", entry.path().display());
            fs::write(entry.path(), rewritten)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_install_prefix_arbitrary_depth() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = tmp
            .path()
            .join("home/user/.qtforge/data/qtsvg/5.15.2/abc/package");
        fs::create_dir_all(prefix.join("include")).unwrap();
        fs::create_dir_all(prefix.join("lib")).unwrap();

        let found = find_install_prefix(tmp.path(), ".qtforge").unwrap();
        assert_eq!(found, prefix);
    }

    #[test]
    fn test_find_install_prefix_legacy_mkspecs() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = tmp.path().join("a/b/.qtforge/c/d/e/f");
        fs::create_dir_all(prefix.join("mkspecs")).unwrap();

        let found = find_install_prefix(tmp.path(), ".qtforge").unwrap();
        assert_eq!(found, prefix);
    }

    #[test]
    fn test_find_install_prefix_requires_marker() {
        let tmp = tempfile::tempdir().unwrap();
        // include exists but no sentinel component above it
        fs::create_dir_all(tmp.path().join("usr/local/include")).unwrap();

        let err = find_install_prefix(tmp.path(), ".qtforge").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_rewrite_descriptor_tokens() {
        let content = "\
QT.svg.includes = $$QT_MODULE_INCLUDE_BASE $$QT_MODULE_INCLUDE_BASE/QtSvg
QT.svg.libs = $$QT_MODULE_LIB_BASE
QT.svg.bins = $$QT_MODULE_BIN_BASE
";
        let out = rewrite_descriptor(content, "QTFORGE_PKG_DIR_QTSVG", "");
        assert!(out.contains("$$(QTFORGE_PKG_DIR_QTSVG)/include/QtSvg"));
        assert!(out.contains("QT.svg.libs = $$(QTFORGE_PKG_DIR_QTSVG)/lib"));
        assert!(out.contains("QT.svg.bins = $$(QTFORGE_PKG_DIR_QTSVG)/bin"));
        assert!(!out.contains("QT_MODULE_INCLUDE_BASE"));
    }

    #[test]
    fn test_rewrite_descriptor_build_path() {
        let content = "QT.svg.priority = /work/qtsvg-build/mkspecs/modules\n";
        let out = rewrite_descriptor(content, "QTFORGE_PKG_DIR_QTSVG", "/work/qtsvg-build");
        assert_eq!(
            out,
            "QT.svg.priority = $$(QTFORGE_PKG_DIR_QTSVG)/mkspecs/modules\n"
        );
    }

    #[test]
    fn test_rewrite_descriptor_is_idempotent_and_tolerant() {
        let content = "QT.svg.name = QtSvg\n";
        let once = rewrite_descriptor(content, "QTFORGE_PKG_DIR_QTSVG", "/work/qtsvg-build");
        assert_eq!(once, content);

        let tokens = "includes = $$QT_MODULE_INCLUDE_BASE\n";
        let once = rewrite_descriptor(tokens, "QTFORGE_PKG_DIR_QTSVG", "/work/qtsvg-build");
        let twice = rewrite_descriptor(&once, "QTFORGE_PKG_DIR_QTSVG", "/work/qtsvg-build");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_copy_tree_missing_source_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        copy_tree(&tmp.path().join("absent"), &tmp.path().join("dst")).unwrap();
        assert!(!tmp.path().join("dst").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_preserves_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("libQt5Svg.so.5.15.2"), b"elf").unwrap();
        std::os::unix::fs::symlink("libQt5Svg.so.5.15.2", src.join("libQt5Svg.so")).unwrap();

        let dst = tmp.path().join("dst");
        copy_tree(&src, &dst).unwrap();

        let meta = dst.join("libQt5Svg.so").symlink_metadata().unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            fs::read_link(dst.join("libQt5Svg.so")).unwrap(),
            PathBuf::from("libQt5Svg.so.5.15.2")
        );
    }

    #[test]
    fn test_strip_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = tmp.path().join("lib");
        let bin = tmp.path().join("bin");
        fs::create_dir_all(lib.join("cmake/Qt5Svg")).unwrap();
        fs::create_dir_all(&bin).unwrap();
        fs::write(lib.join("cmake/Qt5Svg/Qt5SvgConfig.cmake"), b"").unwrap();
        fs::write(lib.join("libQt5Svg.la"), b"").unwrap();
        fs::write(lib.join("libQt5Svg.a"), b"").unwrap();
        fs::write(lib.join("FindQt5Svg.cmake"), b"").unwrap();
        fs::write(bin.join("tool.pdb"), b"").unwrap();
        fs::write(bin.join("tool"), b"").unwrap();

        strip_artifacts(tmp.path()).unwrap();

        assert!(!lib.join("cmake").exists());
        assert!(!lib.join("libQt5Svg.la").exists());
        assert!(!lib.join("FindQt5Svg.cmake").exists());
        assert!(!bin.join("tool.pdb").exists());
        assert!(lib.join("libQt5Svg.a").exists());
        assert!(bin.join("tool").exists());
    }
}
