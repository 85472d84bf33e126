//! YAML layout configuration.
//!
//! # Responsibility
//! - Parse the declarative layout document for Launchpad and Dock.
//! - Resolve default store locations for the current user.
//!
//! # Invariants
//! - Unknown keys are rejected instead of silently ignored.
//! - Raw layout shapes are converted to typed layouts only here.

use crate::model::dock::{DockLayout, DockTile};
use crate::model::layout::{Domain, LayoutSpec, LayoutValidationError};
use crate::service::launchpad_service::LaunchpadRequest;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::Command;

const LAUNCHPAD_DB_SUFFIX: &str = "com.apple.dock.launchpad/db/db";
const DOCK_PLIST_SUFFIX: &str = "Library/Preferences/com.apple.dock.plist";

/// Errors from loading a layout configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_yaml::Error),
    Validation(LayoutValidationError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "unable to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<LayoutValidationError> for ConfigError {
    fn from(value: LayoutValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(default)]
    pub launchpad: Option<LaunchpadConfig>,
    #[serde(default)]
    pub dock: Option<DockConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

/// `launchpad:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchpadConfig {
    pub db_path: Option<PathBuf>,
    pub apps: Option<LayoutSpec>,
    pub widgets: Option<LayoutSpec>,
}

impl LaunchpadConfig {
    /// Converts declared layouts into a reconciliation request.
    pub fn request(&self) -> Result<LaunchpadRequest, ConfigError> {
        let apps = self
            .apps
            .clone()
            .map(|spec| spec.into_layout(Domain::Apps))
            .transpose()?;
        let widgets = self
            .widgets
            .clone()
            .map(|spec| spec.into_layout(Domain::Widgets))
            .transpose()?;
        Ok(LaunchpadRequest { apps, widgets })
    }
}

/// `dock:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockConfig {
    pub plist_path: Option<PathBuf>,
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub others: Vec<DockTile>,
}

impl DockConfig {
    pub fn layout(&self) -> DockLayout {
        DockLayout {
            apps: self.apps.clone(),
            others: self.others.clone(),
        }
    }
}

/// `logging:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub dir: Option<String>,
}

/// Parses a configuration document.
pub fn parse_config(text: &str) -> Result<LayoutConfig, ConfigError> {
    Ok(serde_yaml::from_str(text)?)
}

/// Reads and parses a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<LayoutConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

/// Launchpad database under the per-user Darwin directory, if resolvable.
pub fn default_launchpad_db_path() -> Option<PathBuf> {
    let output = Command::new("getconf")
        .arg("DARWIN_USER_DIR")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let user_dir = String::from_utf8(output.stdout).ok()?;
    let user_dir = user_dir.trim();
    if user_dir.is_empty() {
        return None;
    }
    Some(Path::new(user_dir).join(LAUNCHPAD_DB_SUFFIX))
}

/// Dock preferences plist in the current user's home directory.
pub fn default_dock_plist_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DOCK_PLIST_SUFFIX))
}
