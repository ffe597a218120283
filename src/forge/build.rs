// src/forge/build.rs

//! Build orchestration: qmake configure followed by the native build tool
//!
//! Two sequential child processes run in the build scratch directory:
//! first qmake generates native build files, then make/jom/nmake runs the
//! `install` target into the install scratch directory via `INSTALL_ROOT`.
//! Both must succeed; a non-zero exit from either aborts the run.

use crate::error::{Error, Result};
use crate::settings::{BuildType, Compiler, Settings, TargetOs};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// vcvarsall architecture selected for MSVC builds
const MSVC_ARCH: &str = "x64";

/// MSVC linker options inherited through the environment
const MSVC_LINK_ENV: &str = "_LINK_";

/// A fully resolved pair of configure and build invocations
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Path to qmake inside the resolved qt package
    pub qmake: PathBuf,
    pub qmake_args: Vec<String>,
    /// Native build tool (make, jom or nmake)
    pub tool: PathBuf,
    pub tool_args: Vec<String>,
}

/// Select qmake arguments for the given linkage and build type
///
/// Invalid build-type values never reach this point: they are rejected when
/// [`BuildType`] is parsed.
pub fn qmake_args(shared: bool, build_type: BuildType, project_file: &Path) -> Vec<String> {
    let mut args = Vec::new();

    if !shared {
        args.push("CONFIG+=staticlib".to_string());
    }

    match build_type {
        BuildType::Release => args.push("CONFIG+=release".to_string()),
        BuildType::Debug => args.push("CONFIG+=debug".to_string()),
    }

    args.push("-r".to_string());
    args.push(project_file.to_string_lossy().to_string());

    args
}

/// Probe for the native build tool
///
/// Windows prefers jom (parallel) and falls back to nmake (serial, no `-j`).
/// Everywhere else make is required; its absence is fatal.
pub fn native_tool(os: TargetOs, jobs: u32) -> Result<(PathBuf, Vec<String>)> {
    if os.is_windows() {
        if let Ok(jom) = which::which("jom.exe").or_else(|_| which::which("jom")) {
            debug!("Using jom at {}", jom.display());
            return Ok((jom, vec!["-j".to_string(), jobs.to_string()]));
        }
        debug!("jom not found, falling back to nmake");
        return Ok((PathBuf::from("nmake.exe"), Vec::new()));
    }

    let make = which::which("make")
        .map_err(|_| Error::ToolNotFound("Cannot find make".to_string()))?;
    Ok((make, vec!["-j".to_string(), jobs.to_string()]))
}

/// `INSTALL_ROOT=...` argument for the install target
///
/// The generated makefiles splice INSTALL_ROOT into paths literally, and the
/// splice point differs by platform:
/// - Windows: just after the drive, e.g. `C:$(INSTALL_ROOT)\...`, so the
///   value must be the install dir with its drive prefix stripped.
/// - elsewhere: prefixed to the whole path, e.g. `$(INSTALL_ROOT)/home/...`,
///   so the value is the absolute install dir.
pub fn install_root_arg(os: TargetOs, install_dir: &Path) -> String {
    let raw = install_dir.to_string_lossy();

    if os.is_windows() {
        let bytes = raw.as_bytes();
        let tail: &str = if bytes.len() >= 2 && bytes[1] == b':' {
            &raw[2..]
        } else {
            &raw
        };
        format!("INSTALL_ROOT={}", tail)
    } else {
        format!("INSTALL_ROOT={}", raw)
    }
}

/// Resolve the complete build plan for a recipe run
pub fn plan(
    settings: &Settings,
    shared: bool,
    qt_root: &Path,
    project_file: &Path,
    install_dir: &Path,
    jobs: u32,
) -> Result<BuildPlan> {
    if settings.os.is_windows() && settings.compiler != Compiler::Msvc {
        return Err(Error::Unsupported(format!(
            "Building on Windows with {} is not yet implemented",
            settings.compiler
        )));
    }

    let qmake = if settings.os.is_windows() {
        qt_root.join("bin").join("qmake.exe")
    } else {
        qt_root.join("bin").join("qmake")
    };

    let (tool, mut tool_args) = native_tool(settings.os, jobs)?;
    tool_args.push(install_root_arg(settings.os, install_dir));
    tool_args.push("install".to_string());

    Ok(BuildPlan {
        qmake,
        qmake_args: qmake_args(shared, settings.build_type, project_file),
        tool,
        tool_args,
    })
}

/// Run configure then build in `build_dir`
pub fn execute(
    plan: &BuildPlan,
    settings: &Settings,
    build_dir: &Path,
    vcvars_override: Option<&Path>,
) -> Result<()> {
    info!(
        "QMAKE: {} {}",
        plan.qmake.display(),
        plan.qmake_args.join(" ")
    );
    info!("BUILD: {} {}", plan.tool.display(), plan.tool_args.join(" "));

    if settings.compiler == Compiler::Msvc {
        let vcvars = vcvars_command(vcvars_override)?;
        run_msvc_step("configure", &vcvars, &plan.qmake, &plan.qmake_args, build_dir)?;
        run_msvc_step("build", &vcvars, &plan.tool, &plan.tool_args, build_dir)?;
    } else {
        run_step("configure", &plan.qmake, &plan.qmake_args, build_dir)?;
        run_step("build", &plan.tool, &plan.tool_args, build_dir)?;
    }

    Ok(())
}

/// Run one build step as a blocking child process
fn run_step(phase: &str, program: &Path, args: &[String], cwd: &Path) -> Result<()> {
    debug!("Running {} step: {} {:?}", phase, program.display(), args);

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| Error::CommandFailed(format!(
            "Failed to spawn {} step ({}): {}",
            phase,
            program.display(),
            e
        )))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::CommandFailed(format!(
            "{} step failed with exit code {:?}\nstderr: {}",
            phase,
            output.status.code(),
            stderr
        )));
    }

    Ok(())
}

/// Run one build step inside the MSVC environment
///
/// Wraps the command in `vcvarsall.bat <arch> && ...` through `cmd /C` and
/// drops any inherited `/ENTRY:` override from the `_LINK_` variable, which
/// is incompatible with qmake-generated makefiles.
fn run_msvc_step(
    phase: &str,
    vcvars: &Path,
    program: &Path,
    args: &[String],
    cwd: &Path,
) -> Result<()> {
    let command_line = msvc_command_line(vcvars, program, args);
    debug!("Running {} step: cmd /C {}", phase, command_line);

    let link = std::env::var(MSVC_LINK_ENV).unwrap_or_default();
    let link = strip_entry_flag(&link);

    let output = Command::new("cmd")
        .arg("/C")
        .arg(&command_line)
        .env(MSVC_LINK_ENV, link)
        .current_dir(cwd)
        .output()
        .map_err(|e| Error::CommandFailed(format!("Failed to spawn {} step: {}", phase, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::CommandFailed(format!(
            "{} step failed with exit code {:?}\nstderr: {}",
            phase,
            output.status.code(),
            stderr
        )));
    }

    Ok(())
}

/// Build the `vcvarsall.bat <arch> && <program> <args>` shell line
///
/// Every argument is quoted individually so project-file paths and
/// INSTALL_ROOT values containing spaces survive cmd's word splitting.
fn msvc_command_line(vcvars: &Path, program: &Path, args: &[String]) -> String {
    let quoted: Vec<String> = args.iter().map(|a| format!("\"{}\"", a)).collect();
    format!(
        "\"{}\" {} && \"{}\" {}",
        vcvars.display(),
        MSVC_ARCH,
        program.display(),
        quoted.join(" ")
    )
}

/// Locate vcvarsall.bat
fn vcvars_command(vcvars_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = vcvars_override {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = std::env::var("VCVARSALL") {
        return Ok(PathBuf::from(path));
    }
    which::which("vcvarsall.bat")
        .map_err(|_| Error::ToolNotFound("Cannot find vcvarsall.bat; set VCVARSALL".to_string()))
}

/// Remove entry-point override flags from an MSVC linker options string
pub fn strip_entry_flag(link: &str) -> String {
    link.split_whitespace()
        .filter(|token| {
            let flag = token.trim_start_matches(['/', '-']);
            !flag.to_ascii_uppercase().starts_with("ENTRY:")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Compiler;

    #[test]
    fn test_qmake_args_static_release() {
        let args = qmake_args(false, BuildType::Release, Path::new("/src/qtsvg/qtsvg.pro"));
        assert_eq!(
            args,
            vec!["CONFIG+=staticlib", "CONFIG+=release", "-r", "/src/qtsvg/qtsvg.pro"]
        );
    }

    #[test]
    fn test_qmake_args_shared_debug() {
        let args = qmake_args(true, BuildType::Debug, Path::new("/src/qtsvg/qtsvg.pro"));
        assert_eq!(args, vec!["CONFIG+=debug", "-r", "/src/qtsvg/qtsvg.pro"]);
    }

    #[test]
    fn test_install_root_unix_is_absolute() {
        let arg = install_root_arg(TargetOs::Linux, Path::new("/home/user/work/qtsvg-install"));
        assert_eq!(arg, "INSTALL_ROOT=/home/user/work/qtsvg-install");
    }

    #[test]
    fn test_install_root_windows_is_drive_relative() {
        let arg = install_root_arg(TargetOs::Windows, Path::new(r"C:\work\qtsvg-install"));
        assert_eq!(arg, r"INSTALL_ROOT=\work\qtsvg-install");
    }

    #[test]
    fn test_install_root_windows_without_drive() {
        let arg = install_root_arg(TargetOs::Windows, Path::new(r"\work\qtsvg-install"));
        assert_eq!(arg, r"INSTALL_ROOT=\work\qtsvg-install");
    }

    #[test]
    fn test_plan_rejects_non_msvc_on_windows() {
        let settings = Settings {
            os: TargetOs::Windows,
            compiler: Compiler::Mingw,
            build_type: BuildType::Release,
        };
        let err = plan(
            &settings,
            true,
            Path::new("/qt"),
            Path::new("/src/qtsvg/qtsvg.pro"),
            Path::new(r"C:\work\install"),
            4,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_strip_entry_flag() {
        assert_eq!(
            strip_entry_flag("/DEBUG /ENTRY:mainCRTStartup /OPT:REF"),
            "/DEBUG /OPT:REF"
        );
        assert_eq!(
            strip_entry_flag("-entry:wWinMainCRTStartup /LTCG"),
            "/LTCG"
        );
        assert_eq!(strip_entry_flag(""), "");
        assert_eq!(strip_entry_flag("/DEBUG"), "/DEBUG");
    }

    #[test]
    fn test_msvc_command_line_quotes_spaced_args() {
        let line = msvc_command_line(
            Path::new(r"C:\VS\vcvarsall.bat"),
            Path::new(r"C:\qt\bin\qmake.exe"),
            &[
                "CONFIG+=release".to_string(),
                "-r".to_string(),
                r"C:\My Projects\qtsvg\qtsvg.pro".to_string(),
            ],
        );
        assert_eq!(
            line,
            r#""C:\VS\vcvarsall.bat" x64 && "C:\qt\bin\qmake.exe" "CONFIG+=release" "-r" "C:\My Projects\qtsvg\qtsvg.pro""#
        );
    }

    #[test]
    fn test_native_tool_windows_falls_back_to_nmake() {
        // jom is not on PATH in the test environment
        if which::which("jom").is_ok() || which::which("jom.exe").is_ok() {
            return;
        }
        let (tool, args) = native_tool(TargetOs::Windows, 8).unwrap();
        assert_eq!(tool, PathBuf::from("nmake.exe"));
        assert!(args.is_empty());
    }
}
