// src/settings.rs

//! Host-supplied build settings
//!
//! Settings describe the target platform and build configuration the host
//! passes to a recipe run: target OS, compiler, build type, and the
//! shared/static linkage option. Defaults come from the platform qtforge
//! itself runs on; every field can be overridden from the CLI.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOs {
    Windows,
    Linux,
    Macos,
}

impl TargetOs {
    /// OS qtforge is running on
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::Macos
        } else {
            TargetOs::Linux
        }
    }

    pub fn is_windows(self) -> bool {
        self == TargetOs::Windows
    }

    pub fn is_apple(self) -> bool {
        self == TargetOs::Macos
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetOs::Windows => "windows",
            TargetOs::Linux => "linux",
            TargetOs::Macos => "macos",
        }
    }
}

impl FromStr for TargetOs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(TargetOs::Windows),
            "linux" => Ok(TargetOs::Linux),
            "macos" | "darwin" => Ok(TargetOs::Macos),
            other => Err(Error::InvalidConfig(format!("Unknown target OS: {}", other))),
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiler toolchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compiler {
    Msvc,
    Gcc,
    Clang,
    Mingw,
}

impl Compiler {
    /// Best guess for the host's default compiler
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Compiler::Msvc
        } else if cfg!(target_os = "macos") {
            Compiler::Clang
        } else {
            Compiler::Gcc
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Compiler::Msvc => "msvc",
            Compiler::Gcc => "gcc",
            Compiler::Clang => "clang",
            Compiler::Mingw => "mingw",
        }
    }
}

impl FromStr for Compiler {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "msvc" | "visual-studio" => Ok(Compiler::Msvc),
            "gcc" => Ok(Compiler::Gcc),
            "clang" | "apple-clang" => Ok(Compiler::Clang),
            "mingw" => Ok(Compiler::Mingw),
            other => Err(Error::InvalidConfig(format!("Unknown compiler: {}", other))),
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build configuration
///
/// Only Release and Debug are valid; anything else is rejected when parsed
/// so a bad value never reaches the build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildType {
    Release,
    Debug,
}

impl BuildType {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildType::Release => "release",
            BuildType::Debug => "debug",
        }
    }
}

impl FromStr for BuildType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "release" => Ok(BuildType::Release),
            "debug" => Ok(BuildType::Debug),
            other => Err(Error::InvalidConfig(format!("Invalid build type: {}", other))),
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full set of settings for one recipe run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub os: TargetOs,
    pub compiler: Compiler,
    pub build_type: BuildType,
}

impl Settings {
    /// Settings matching the host platform, building Release
    pub fn host() -> Self {
        Self {
            os: TargetOs::host(),
            compiler: Compiler::host(),
            build_type: BuildType::Release,
        }
    }

    /// Debug suffix appended to exported library names
    ///
    /// Qt appends `d` to library names on Windows debug builds and `_debug`
    /// on Apple platforms; every other combination has no suffix.
    pub fn debug_suffix(&self) -> &'static str {
        match (self.os, self.build_type) {
            (TargetOs::Windows, BuildType::Debug) => "d",
            (TargetOs::Macos, BuildType::Debug) => "_debug",
            _ => "",
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::host()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_type_parse() {
        assert_eq!("release".parse::<BuildType>().unwrap(), BuildType::Release);
        assert_eq!("Debug".parse::<BuildType>().unwrap(), BuildType::Debug);
        assert!("RelWithDebInfo".parse::<BuildType>().is_err());
        assert!("".parse::<BuildType>().is_err());
    }

    #[test]
    fn test_debug_suffix_matrix() {
        let mk = |os, build_type| Settings {
            os,
            compiler: Compiler::Gcc,
            build_type,
        };
        assert_eq!(mk(TargetOs::Windows, BuildType::Debug).debug_suffix(), "d");
        assert_eq!(mk(TargetOs::Macos, BuildType::Debug).debug_suffix(), "_debug");
        assert_eq!(mk(TargetOs::Linux, BuildType::Debug).debug_suffix(), "");
        assert_eq!(mk(TargetOs::Windows, BuildType::Release).debug_suffix(), "");
        assert_eq!(mk(TargetOs::Macos, BuildType::Release).debug_suffix(), "");
        assert_eq!(mk(TargetOs::Linux, BuildType::Release).debug_suffix(), "");
    }

    #[test]
    fn test_host_settings() {
        let settings = Settings::host();
        assert_eq!(settings.build_type, BuildType::Release);
    }
}
