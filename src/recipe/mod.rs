// src/recipe/mod.rs

//! Module recipes
//!
//! A recipe names a Qt module and the options to build it with. The heavy
//! lifting (source acquisition, qmake/make orchestration, packaging) lives
//! in [`crate::forge`]; recipes are deliberately just data plus a handful of
//! derived names.

mod format;
pub mod parser;

pub use format::{ModuleSection, OptionsSection, Recipe, DEFAULT_UPSTREAM_BASE};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe};
