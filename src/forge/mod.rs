// src/forge/mod.rs

//! The Forge: lifecycle engine for module recipes
//!
//! A recipe run is a fixed sequence of stages, each a blocking call:
//!
//! 1. version resolution
//! 2. requirements declaration and resolution
//! 3. source acquisition
//! 4. build (qmake configure + native install)
//! 5. packaging into the cache
//! 6. package-metadata export
//!
//! Any stage failure aborts the whole run; there are no retries and no
//! partial results.

pub mod build;
pub mod metadata;
pub mod package;
pub mod source;

pub use metadata::PackageInfo;

use crate::cache::PackageCache;
use crate::error::Result;
use crate::recipe::{validate_recipe, Recipe};
use crate::settings::Settings;
use crate::version;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;

/// Name of the core framework package every module depends on
pub const CORE_PACKAGE: &str = "qt";

/// Configuration for the Forge
#[derive(Debug)]
pub struct ForgeConfig {
    /// Package cache root; its directory name is the install-tree sentinel
    pub cache_root: PathBuf,
    /// Scratch directory for checkouts and build/install trees; a fresh
    /// temporary directory is used when unset
    pub work_dir: Option<PathBuf>,
    /// Parallel jobs passed to the native build tool
    pub jobs: u32,
    /// Keep the scratch directory after the run (for debugging)
    pub keep_workdir: bool,
    /// Explicit qt package root, bypassing cache lookup
    pub qt_root: Option<PathBuf>,
    /// Explicit vcvarsall.bat location for MSVC builds
    pub vcvars: Option<PathBuf>,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        Self {
            cache_root: PackageCache::default_root(),
            work_dir: None,
            jobs,
            keep_workdir: false,
            qt_root: None,
            vcvars: None,
        }
    }
}

/// A dependency declared by a recipe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub version: String,
    /// Linkage option propagated so the whole graph links consistently
    pub shared: bool,
}

/// Result of a completed recipe run
#[derive(Debug)]
pub struct ForgeResult {
    /// Final package location in the cache
    pub package_dir: PathBuf,
    /// Exported metadata for downstream consumers
    pub info: PackageInfo,
    /// Resolved module version
    pub version: String,
    /// Requirements the run was resolved against
    pub requirements: Vec<Requirement>,
}

/// The Forge: builds module recipes into cached packages
pub struct Forge {
    config: ForgeConfig,
    cache: PackageCache,
}

/// Scratch directory for one run
enum WorkDir {
    Temp(TempDir),
    Fixed(PathBuf),
}

impl WorkDir {
    fn path(&self) -> &Path {
        match self {
            WorkDir::Temp(dir) => dir.path(),
            WorkDir::Fixed(path) => path,
        }
    }
}

impl Forge {
    pub fn new(config: ForgeConfig) -> Self {
        let cache = PackageCache::new(config.cache_root.clone());
        Self { config, cache }
    }

    pub fn with_defaults() -> Self {
        Self::new(ForgeConfig::default())
    }

    pub fn cache(&self) -> &PackageCache {
        &self.cache
    }

    /// Resolve the version for a recipe
    ///
    /// A pinned version wins (normalized the same way as git refs); without
    /// one the version comes from the override env var or the recipe
    /// folder's git ref.
    pub fn resolve_version(&self, recipe: &Recipe, recipe_dir: &Path) -> Result<String> {
        match &recipe.module.version {
            Some(pinned) => version::normalize_ref(pinned),
            None => version::resolve_version(recipe_dir),
        }
    }

    /// Requirements declared for a recipe at `version`
    ///
    /// Every module depends on the core framework package pinned to the
    /// same version, with the shared/static option propagated.
    pub fn requirements(&self, recipe: &Recipe, version: &str) -> Vec<Requirement> {
        vec![Requirement {
            name: CORE_PACKAGE.to_string(),
            version: version.to_string(),
            shared: recipe.options.shared,
        }]
    }

    /// Run the full lifecycle for a recipe
    pub fn run(
        &self,
        recipe: &Recipe,
        recipe_dir: &Path,
        settings: &Settings,
    ) -> Result<ForgeResult> {
        // Warnings are surfaced where the recipe is loaded; here only hard
        // validation failures stop the run.
        validate_recipe(recipe)?;

        // Stage 1: version
        let version = self.resolve_version(recipe, recipe_dir)?;
        info!("Building {} version {}", recipe.module.name, version);

        // Stage 2: requirements
        let requirements = self.requirements(recipe, &version);
        let qt_root = match &self.config.qt_root {
            Some(root) => root.clone(),
            None => self.cache.require_package(CORE_PACKAGE, &version)?,
        };
        info!("Using {} from {}", CORE_PACKAGE, qt_root.display());

        let work = self.work_dir()?;
        let name = &recipe.module.name;
        let source_dir = work.path().join(name);
        let build_dir = work.path().join(format!("{}-build", name));
        let install_dir = work.path().join(format!("{}-install", name));

        if !build_dir.exists() {
            fs::create_dir_all(&build_dir)?;
        }
        if !install_dir.exists() {
            fs::create_dir_all(&install_dir)?;
        }

        // Stage 3: source
        info!("Acquiring sources...");
        source::acquire(&recipe.upstream_url(), &version, &source_dir)?;

        // Stage 4: build
        info!("Configuring and building...");
        let project_file = source_dir.join(recipe.project_file());
        let plan = build::plan(
            settings,
            recipe.options.shared,
            &qt_root,
            &project_file,
            &install_dir,
            self.config.jobs,
        )?;
        build::execute(&plan, settings, &build_dir, self.config.vcvars.as_deref())?;

        // Stage 5: package
        info!("Packaging...");
        let id = PackageCache::package_id(recipe, &version, settings);
        let package_dir = self.cache.create_package_dir(name, &version, &id)?;
        package::assemble(
            &install_dir,
            &build_dir,
            &package_dir,
            &self.cache.marker(),
            &recipe.package_dir_var(),
        )?;

        // Stage 6: metadata export
        let pkg_info = metadata::export(&package_dir, recipe, settings)?;
        metadata::write_info(&package_dir, &pkg_info)?;
        info!("Done: {}", package_dir.display());

        if self.config.keep_workdir {
            let kept = match work {
                WorkDir::Temp(dir) => dir.keep(),
                WorkDir::Fixed(path) => path,
            };
            info!("Keeping work directory {}", kept.display());
        }

        Ok(ForgeResult {
            package_dir,
            info: pkg_info,
            version,
            requirements,
        })
    }

    /// Acquire sources for a recipe without building
    pub fn fetch(&self, recipe: &Recipe, recipe_dir: &Path) -> Result<PathBuf> {
        let version = self.resolve_version(recipe, recipe_dir)?;

        let base = match &self.config.work_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        fs::create_dir_all(&base)?;

        let source_dir = base.join(&recipe.module.name);
        source::acquire(&recipe.upstream_url(), &version, &source_dir)?;
        Ok(source_dir)
    }

    fn work_dir(&self) -> Result<WorkDir> {
        match &self.config.work_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                Ok(WorkDir::Fixed(dir.clone()))
            }
            None => {
                let dir = TempDir::with_prefix("qtforge-")?;
                Ok(WorkDir::Temp(dir))
            }
        }
    }
}
