// src/recipe/format.rs

//! Recipe file format definitions
//!
//! A recipe is a small TOML file naming the module to build:
//!
//! ```toml
//! [module]
//! name = "qtsvg"
//! # version = "5.15.2"   # optional; resolved from git/env when absent
//!
//! [options]
//! shared = true
//! ```

use serde::{Deserialize, Serialize};

/// Default upstream host for Qt module repositories
pub const DEFAULT_UPSTREAM_BASE: &str = "https://code.qt.io/qt";

/// A module build recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Module identity
    pub module: ModuleSection,

    /// Build options
    #[serde(default)]
    pub options: OptionsSection,
}

/// The `[module]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSection {
    /// Module name, e.g. `qtsvg`
    pub name: String,

    /// Pinned version; when absent the version is resolved from the
    /// `QTFORGE_VERSION` env var or the recipe folder's git ref
    #[serde(default)]
    pub version: Option<String>,

    /// Upstream repository URL override
    #[serde(default)]
    pub repository: Option<String>,
}

/// The `[options]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsSection {
    /// Build shared libraries (false builds with `CONFIG+=staticlib`)
    #[serde(default = "default_shared")]
    pub shared: bool,
}

fn default_shared() -> bool {
    true
}

impl Default for OptionsSection {
    fn default() -> Self {
        Self { shared: true }
    }
}

impl Recipe {
    /// Create a recipe in memory (mostly for tests and embedding)
    pub fn new(name: &str) -> Self {
        Self {
            module: ModuleSection {
                name: name.to_string(),
                version: None,
                repository: None,
            },
            options: OptionsSection::default(),
        }
    }

    /// Upstream git URL for the module
    pub fn upstream_url(&self) -> String {
        match &self.module.repository {
            Some(url) => url.clone(),
            None => format!("{}/{}.git", DEFAULT_UPSTREAM_BASE, self.module.name),
        }
    }

    /// Name of the module's top-level qmake project file
    pub fn project_file(&self) -> String {
        format!("{}.pro", self.module.name)
    }

    /// Uppercased module name used in env vars and defines
    fn upper_name(&self) -> String {
        self.module
            .name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Per-module environment variable naming the package location
    ///
    /// Referenced as `$$(VAR)` from rewritten `.pri` descriptor files, so
    /// packages stay valid after relocation to any consumer's cache.
    pub fn package_dir_var(&self) -> String {
        format!("QTFORGE_PKG_DIR_{}", self.upper_name())
    }

    /// Preprocessor define naming the module, e.g. `QT_QTSVG_LIB`
    pub fn define_name(&self) -> String {
        format!("QT_{}_LIB", self.upper_name())
    }

    /// Canonical library name, e.g. `Qt5Svg` for module `qtsvg`
    ///
    /// Used as the fallback link-library name when the packaged `lib`
    /// directory yields nothing, and as the cmake discovery name.
    pub fn canonical_lib(&self) -> String {
        let bare = self
            .module
            .name
            .strip_prefix("qt")
            .filter(|rest| !rest.is_empty())
            .unwrap_or(&self.module.name);

        let mut chars = bare.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        };

        format!("Qt5{}", capitalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_url_default() {
        let recipe = Recipe::new("qtsvg");
        assert_eq!(recipe.upstream_url(), "https://code.qt.io/qt/qtsvg.git");
    }

    #[test]
    fn test_upstream_url_override() {
        let mut recipe = Recipe::new("qtsvg");
        recipe.module.repository = Some("https://example.com/fork.git".to_string());
        assert_eq!(recipe.upstream_url(), "https://example.com/fork.git");
    }

    #[test]
    fn test_derived_names() {
        let recipe = Recipe::new("qtsvg");
        assert_eq!(recipe.project_file(), "qtsvg.pro");
        assert_eq!(recipe.package_dir_var(), "QTFORGE_PKG_DIR_QTSVG");
        assert_eq!(recipe.define_name(), "QT_QTSVG_LIB");
        assert_eq!(recipe.canonical_lib(), "Qt5Svg");
    }

    #[test]
    fn test_names_without_qt_prefix() {
        let recipe = Recipe::new("foo");
        assert_eq!(recipe.define_name(), "QT_FOO_LIB");
        assert_eq!(recipe.canonical_lib(), "Qt5Foo");
    }

    #[test]
    fn test_names_with_dash() {
        let recipe = Recipe::new("qt-extras");
        assert_eq!(recipe.package_dir_var(), "QTFORGE_PKG_DIR_QT_EXTRAS");
    }
}
