//! Agent supervisor CLI.
//!
//! Validates the supervisor's template, then loops over the fleet root:
//! resolve projects, run each project's task loop, sleep, repeat.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

use arborist::exit_codes;
use arborist::fleet::{Fleet, FleetConfig, validate_template};
use arborist::io::agent::CommandAgent;
use arborist::io::config::{load_config, load_required_config};
use arborist::io::paths::SupervisorPaths;
use arborist::logging;

#[derive(Parser, Debug)]
#[command(
    name = "arborist",
    version,
    about = "Supervise an external agent across a fleet of task-list projects"
)]
struct Cli {
    /// Folder of projects to supervise. Defaults to the parent of `--home`.
    root: Option<PathBuf>,

    /// Supervisor home holding `templates/`, instruction files and `arborist.toml`.
    #[arg(long, default_value = ".")]
    home: PathBuf,

    /// Config file; must exist when given. Defaults to `<home>/arborist.toml`, used only if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single fleet cycle and exit.
    #[arg(long)]
    once: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FATAL_STARTUP);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let home = std::path::absolute(&cli.home)
        .with_context(|| format!("resolve home {}", cli.home.display()))?;
    let supervisor = SupervisorPaths::new(&home);
    let root = resolve_root(cli.root.as_deref(), &home)?;

    let cfg = match &cli.config {
        Some(path) => load_required_config(path)?,
        None => load_config(&supervisor.config_path)?,
    };
    validate_template(&supervisor)?;

    info!(root = %root.display(), home = %home.display(), "starting supervisor");
    let agent = CommandAgent::new(&cfg.agent, &supervisor.home, cfg.kill_grace());
    let mut fleet = Fleet::new(&agent, FleetConfig::new(root, supervisor, &cfg));

    if cli.once {
        let report = fleet.run_cycle();
        return Ok(if report.aborted {
            exit_codes::CYCLE_ABORTED
        } else {
            exit_codes::OK
        });
    }
    fleet.run_forever()
}

fn resolve_root(root: Option<&Path>, home: &Path) -> Result<PathBuf> {
    let root = root.map(Path::to_path_buf).unwrap_or_else(|| home.join(".."));
    if !root.is_dir() {
        bail!("Projects folder not found: {}", root.display());
    }
    root.canonicalize()
        .with_context(|| format!("resolve root {}", root.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults() {
        let cli = Cli::parse_from(["arborist"]);
        assert_eq!(cli.root, None);
        assert_eq!(cli.home, PathBuf::from("."));
        assert!(!cli.once);
    }

    #[test]
    fn parse_root_and_once() {
        let cli = Cli::parse_from(["arborist", "../projects", "--once", "--home", "/opt/a"]);
        assert_eq!(cli.root, Some(PathBuf::from("../projects")));
        assert_eq!(cli.home, PathBuf::from("/opt/a"));
        assert!(cli.once);
    }

    #[test]
    fn missing_root_is_fatal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = resolve_root(Some(temp.path().join("nope").as_path()), temp.path()).unwrap_err();
        assert!(err.to_string().contains("Projects folder not found"));
    }

    #[test]
    fn default_root_is_parent_of_home() {
        let temp = tempfile::tempdir().expect("tempdir");
        let home = temp.path().join("arborist");
        std::fs::create_dir(&home).expect("mkdir");

        let root = resolve_root(None, &home).expect("root");
        assert_eq!(root, temp.path().canonicalize().expect("canonical"));
    }
}
