// src/recipe/parser.rs

//! Recipe file parsing

use crate::error::{Error, Result};
use crate::recipe::format::Recipe;
use std::path::Path;

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid recipe: {}", e)))
}

/// Parse a recipe from a file
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read recipe file: {}", e)))?;

    parse_recipe(&content)
}

/// Validate a recipe, returning non-fatal warnings
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    let name = &recipe.module.name;
    if name.is_empty() {
        return Err(Error::ParseError("Recipe module name cannot be empty".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(Error::ParseError(format!(
            "Recipe module name '{}' must not contain path separators",
            name
        )));
    }

    if let Some(version) = &recipe.module.version {
        if version.is_empty() {
            return Err(Error::ParseError(
                "Pinned version cannot be empty; omit it to resolve from git".to_string(),
            ));
        }
    } else {
        warnings.push(format!(
            "No pinned version for '{}'; it will be resolved from QTFORGE_VERSION or git",
            name
        ));
    }

    if !name.starts_with("qt") {
        warnings.push(format!(
            "Module name '{}' does not follow the qt* naming convention",
            name
        ));
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_recipe() {
        let content = r#"
[module]
name = "qtsvg"
version = "5.15.2"

[options]
shared = false
"#;
        let recipe = parse_recipe(content).unwrap();
        assert_eq!(recipe.module.name, "qtsvg");
        assert_eq!(recipe.module.version.as_deref(), Some("5.15.2"));
        assert!(!recipe.options.shared);
    }

    #[test]
    fn test_parse_minimal_recipe_defaults() {
        let recipe = parse_recipe("[module]\nname = \"qtsvg\"\n").unwrap();
        assert!(recipe.module.version.is_none());
        assert!(recipe.options.shared);
    }

    #[test]
    fn test_parse_invalid_recipe() {
        assert!(parse_recipe("this is not valid toml at all {}").is_err());
        assert!(parse_recipe("[options]\nshared = true\n").is_err());
    }

    #[test]
    fn test_validate_empty_name() {
        let recipe = parse_recipe("[module]\nname = \"\"\n").unwrap();
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_validate_path_in_name() {
        let recipe = parse_recipe("[module]\nname = \"../evil\"\n").unwrap();
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_validate_warnings() {
        let recipe = parse_recipe("[module]\nname = \"libfoo\"\n").unwrap();
        let warnings = validate_recipe(&recipe).unwrap();
        assert!(warnings.iter().any(|w| w.contains("resolved")));
        assert!(warnings.iter().any(|w| w.contains("naming convention")));
    }
}
