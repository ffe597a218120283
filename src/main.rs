// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qtforge::{
    parse_recipe_file, validate_recipe, BuildType, Compiler, Forge, ForgeConfig, Settings,
    TargetOs,
};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qtforge")]
#[command(author, version, about = "Build Qt modules with qmake into a local package cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a module recipe and publish the package into the cache
    Build {
        /// Path to the recipe TOML file
        recipe: PathBuf,
        /// Build type: release or debug
        #[arg(long, default_value = "release")]
        build_type: String,
        /// Target OS override (windows, linux, macos)
        #[arg(long)]
        os: Option<String>,
        /// Compiler override (msvc, gcc, clang, mingw)
        #[arg(long)]
        compiler: Option<String>,
        /// Force a static build regardless of the recipe's options
        #[arg(long, conflicts_with = "shared")]
        r#static: bool,
        /// Force a shared build regardless of the recipe's options
        #[arg(long)]
        shared: bool,
        /// Cache root (default: ~/.qtforge)
        #[arg(long)]
        cache_root: Option<PathBuf>,
        /// Qt package root, bypassing cache lookup
        #[arg(long)]
        qt_root: Option<PathBuf>,
        /// Work directory for checkouts and scratch trees
        #[arg(long)]
        work_dir: Option<PathBuf>,
        /// Keep the work directory after the run
        #[arg(long)]
        keep_workdir: bool,
        /// Parallel jobs for the native build tool
        #[arg(short, long)]
        jobs: Option<u32>,
    },
    /// Clone a recipe's sources without building
    Fetch {
        /// Path to the recipe TOML file
        recipe: PathBuf,
        /// Directory to clone into (default: current directory)
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },
    /// Resolve and print a recipe's version, requirements and derived names
    Info {
        /// Path to the recipe TOML file
        recipe: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            recipe,
            build_type,
            os,
            compiler,
            r#static,
            shared,
            cache_root,
            qt_root,
            work_dir,
            keep_workdir,
            jobs,
        } => {
            let (parsed, recipe_dir) = load_recipe(&recipe)?;
            let mut parsed = parsed;
            if r#static {
                parsed.options.shared = false;
            } else if shared {
                parsed.options.shared = true;
            }

            let mut settings = Settings::host();
            settings.build_type = build_type.parse::<BuildType>()?;
            if let Some(os) = os {
                settings.os = os.parse::<TargetOs>()?;
            }
            if let Some(compiler) = compiler {
                settings.compiler = compiler.parse::<Compiler>()?;
            }

            let mut config = ForgeConfig {
                work_dir,
                keep_workdir,
                qt_root,
                ..ForgeConfig::default()
            };
            if let Some(root) = cache_root {
                config.cache_root = root;
            }
            if let Some(jobs) = jobs {
                config.jobs = jobs;
            }

            let forge = Forge::new(config);
            let result = forge.run(&parsed, &recipe_dir, &settings)?;

            println!("Package: {}", result.package_dir.display());
            println!("Version: {}", result.version);
            println!("Libs:    {}", result.info.libs.join(" "));
            println!("Defines: {}", result.info.defines.join(" "));
        }
        Commands::Fetch { recipe, work_dir } => {
            let (parsed, recipe_dir) = load_recipe(&recipe)?;
            let config = ForgeConfig {
                work_dir,
                ..ForgeConfig::default()
            };
            let forge = Forge::new(config);
            let source_dir = forge.fetch(&parsed, &recipe_dir)?;
            println!("Sources: {}", source_dir.display());
        }
        Commands::Info { recipe } => {
            let (parsed, recipe_dir) = load_recipe(&recipe)?;
            let forge = Forge::with_defaults();
            let version = forge.resolve_version(&parsed, &recipe_dir)?;

            println!("Module:   {}", parsed.module.name);
            println!("Version:  {}", version);
            println!("Upstream: {}", parsed.upstream_url());
            println!("Shared:   {}", parsed.options.shared);
            println!("Define:   {}", parsed.define_name());
            println!("Env var:  {}", parsed.package_dir_var());
            for req in forge.requirements(&parsed, &version) {
                println!(
                    "Requires: {}/{} (shared={})",
                    req.name, req.version, req.shared
                );
            }
        }
    }

    Ok(())
}

/// Parse and validate a recipe file, returning it with its folder
fn load_recipe(path: &Path) -> Result<(qtforge::Recipe, PathBuf)> {
    let recipe = parse_recipe_file(path)
        .with_context(|| format!("Failed to load recipe {}", path.display()))?;

    for warning in validate_recipe(&recipe)? {
        warn!("{}", warning);
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok((recipe, dir))
}
