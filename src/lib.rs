// src/lib.rs

//! qtforge
//!
//! Builds Qt modules from source with qmake and publishes them into a
//! relocatable local package cache, together with the metadata downstream
//! consumers need to find headers, libraries, plugins and `.pri` module
//! descriptors.
//!
//! # Architecture
//!
//! - Recipes are small TOML files naming a module and its options
//! - The [`forge::Forge`] runs a fixed lifecycle: version resolution,
//!   requirements, source acquisition, build, packaging, metadata export
//! - Packages land under `<cache>/data/<name>/<version>/<id>/package`;
//!   the cache directory name doubles as the sentinel used to locate
//!   nested install output
//! - Every failure is fatal and propagates to the caller

pub mod cache;
mod error;
pub mod forge;
pub mod recipe;
pub mod settings;
pub mod version;

pub use cache::PackageCache;
pub use error::{Error, Result};
pub use forge::{Forge, ForgeConfig, ForgeResult, PackageInfo, Requirement};
pub use recipe::{parse_recipe, parse_recipe_file, validate_recipe, Recipe};
pub use settings::{BuildType, Compiler, Settings, TargetOs};
