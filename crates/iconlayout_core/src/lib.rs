//! Declarative icon layout reconciliation for Launchpad and the Dock.
//! This crate is the single source of truth for layout invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{
    default_dock_plist_path, default_launchpad_db_path, load_config, parse_config, ConfigError,
    DockConfig, LaunchpadConfig, LayoutConfig, LoggingConfig,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::dock::{
    Arrangement, DirectoryTile, DisplayAs, DockLayout, DockTile, FileTile, ShowAs, UrlTile,
};
pub use model::layout::{
    layouts_equal, Domain, Folder, Item, LaunchpadLayout, Layout, LayoutSpec,
    LayoutValidationError, Page,
};
pub use model::mapping::{ItemType, StoreEntry, TitleMapping};
pub use repo::dock_repo::{DockRepository, PlistDockRepository};
pub use repo::launchpad_repo::{LaunchpadRepository, SqliteLaunchpadRepository};
pub use repo::{StoreError, StoreResult};
pub use service::dock_service::{DockOutcome, DockService};
pub use service::launchpad_service::{LaunchpadOutcome, LaunchpadRequest, LaunchpadService};
pub use service::validate::LAUNCHPAD_PAGE_CAPACITY;
pub use service::{ReconcileError, ReconcileResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
