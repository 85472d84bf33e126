//! Command-line runner for icon layout reconciliation.
//!
//! # Responsibility
//! - Parse commands, load configuration and open the requested store.
//! - Print outcomes as JSON; exit non-zero with the error text on failure.

use clap::{Args, Parser, Subcommand};
use iconlayout_core::db::open_store;
use iconlayout_core::{
    default_dock_plist_path, default_launchpad_db_path, default_log_level, init_logging,
    load_config, DockService, LaunchpadService, LayoutConfig, PlistDockRepository,
    ReconcileError, SqliteLaunchpadRepository, StoreError,
};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(
    name = "iconlayout",
    version,
    about = "Arrange Launchpad and Dock icons from a declarative layout"
)]
struct Cli {
    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files. Logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    target: Target,
}

#[derive(Debug, Subcommand)]
enum Target {
    /// Launchpad app and widget grids.
    Launchpad {
        #[command(subcommand)]
        action: Action,
    },
    /// Dock apps and others sections.
    Dock {
        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Print the current layout.
    Extract(StoreArgs),
    /// Reconcile the store against a layout file.
    Apply {
        /// YAML layout file.
        #[arg(long)]
        config: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Debug, Args)]
struct StoreArgs {
    /// Store file; overrides the config and the per-user default.
    #[arg(long)]
    store: Option<PathBuf>,
}

impl Action {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Self::Extract(_) => None,
            Self::Apply { config, .. } => Some(config.as_path()),
        }
    }

    fn store_override(&self) -> Option<&Path> {
        match self {
            Self::Extract(store) | Self::Apply { store, .. } => store.store.as_deref(),
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("iconlayout: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<String> {
    let action = match &cli.target {
        Target::Launchpad { action } | Target::Dock { action } => action,
    };
    let config = action.config_path().map(load_config).transpose()?;
    start_logging(&cli, config.as_ref())?;

    match &cli.target {
        Target::Launchpad { action } => run_launchpad(action, config.as_ref()),
        Target::Dock { action } => run_dock(action, config.as_ref()),
    }
}

fn start_logging(cli: &Cli, config: Option<&LayoutConfig>) -> CliResult<()> {
    let logging = config.and_then(|config| config.logging.as_ref());
    let Some(dir) = cli
        .log_dir
        .clone()
        .or_else(|| logging.and_then(|logging| logging.dir.clone()))
    else {
        return Ok(());
    };
    let level = cli
        .log_level
        .clone()
        .or_else(|| logging.and_then(|logging| logging.level.clone()))
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, &dir)?;
    Ok(())
}

fn run_launchpad(action: &Action, config: Option<&LayoutConfig>) -> CliResult<String> {
    let section = config.and_then(|config| config.launchpad.as_ref());
    let path = resolve_store_path(
        action.store_override(),
        section.and_then(|section| section.db_path.as_deref()),
        default_launchpad_db_path,
    )?;
    info!("event=cli_run module=cli status=start target=launchpad");

    let conn = open_store(&path).map_err(|err| ReconcileError::StoreAccess(StoreError::from(err)))?;
    let repo = SqliteLaunchpadRepository::try_new(&conn).map_err(ReconcileError::StoreAccess)?;
    let service = LaunchpadService::new(repo);

    match action {
        Action::Extract(_) => to_json(&service.extract()?),
        Action::Apply { .. } => {
            let section = section.ok_or("config has no `launchpad` section")?;
            let outcome = service.reconcile(&section.request()?)?;
            to_json(&outcome)
        }
    }
}

fn run_dock(action: &Action, config: Option<&LayoutConfig>) -> CliResult<String> {
    let section = config.and_then(|config| config.dock.as_ref());
    let path = resolve_store_path(
        action.store_override(),
        section.and_then(|section| section.plist_path.as_deref()),
        default_dock_plist_path,
    )?;
    info!("event=cli_run module=cli status=start target=dock");

    let repo = PlistDockRepository::try_new(path).map_err(ReconcileError::StoreAccess)?;
    let service = DockService::new(repo);

    match action {
        Action::Extract(_) => to_json(&service.extract()?),
        Action::Apply { .. } => {
            let section = section.ok_or("config has no `dock` section")?;
            let outcome = service.reconcile(&section.layout())?;
            to_json(&outcome)
        }
    }
}

fn resolve_store_path(
    cli_override: Option<&Path>,
    config_path: Option<&Path>,
    default_path: fn() -> Option<PathBuf>,
) -> CliResult<PathBuf> {
    cli_override
        .or(config_path)
        .map(Path::to_path_buf)
        .or_else(default_path)
        .ok_or_else(|| "unable to determine store location; pass --store".into())
}

fn to_json(value: &impl Serialize) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
