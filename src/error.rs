// src/error.rs

//! Error types for qtforge
//!
//! Every stage failure is fatal: errors propagate straight up to the caller
//! and abort the recipe run. There are no retries and no partial successes.

use thiserror::Error;

/// Result type used throughout qtforge
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building and packaging a module
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure (file operations, directory creation, ...)
    #[error("I/O error: {0}")]
    IoError(String),

    /// A required external tool could not be found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The platform/compiler combination is not supported
    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    /// An invalid configuration value was supplied
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An external command exited with a non-zero status
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// A declared requirement could not be resolved from the cache
    #[error("Resolution error: {0}")]
    ResolutionError(String),

    /// A recipe file could not be parsed or validated
    #[error("Parse error: {0}")]
    ParseError(String),

    /// An expected file or directory was not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The module version could not be determined
    #[error("Version error: {0}")]
    VersionError(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        Error::IoError(e.to_string())
    }
}
