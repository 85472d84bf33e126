//! Dock layout model.
//!
//! # Responsibility
//! - Define the flat app list and the directory/document/URL "others" list.
//! - Map directory display attributes to and from their integer codes.
//! - Normalize paths so declared and extracted layouts compare equal.
//!
//! # Invariants
//! - App entries are absolute paths after normalization.
//! - Tile kind is resolved once by shape (`path`, `file` or `url`) at
//!   deserialization.

use serde::{Deserialize, Serialize};
use std::path::Path;

const APPLICATIONS_DIR: &str = "/Applications";

/// Sort order of a directory stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Arrangement {
    #[default]
    Name,
    DateAdded,
    DateModified,
    DateCreated,
    Kind,
}

impl Arrangement {
    pub fn code(self) -> i64 {
        match self {
            Self::Name => 1,
            Self::DateAdded => 2,
            Self::DateModified => 3,
            Self::DateCreated => 4,
            Self::Kind => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Name),
            2 => Some(Self::DateAdded),
            3 => Some(Self::DateModified),
            4 => Some(Self::DateCreated),
            5 => Some(Self::Kind),
            _ => None,
        }
    }
}

/// Whether a directory tile renders as a stack or a folder icon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayAs {
    #[default]
    Stack,
    Folder,
}

impl DisplayAs {
    pub fn code(self) -> i64 {
        match self {
            Self::Stack => 0,
            Self::Folder => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Stack),
            1 => Some(Self::Folder),
            _ => None,
        }
    }
}

/// How an opened directory tile shows its content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShowAs {
    #[default]
    Auto,
    Fan,
    Grid,
    List,
}

impl ShowAs {
    pub fn code(self) -> i64 {
        match self {
            Self::Auto => 0,
            Self::Fan => 1,
            Self::Grid => 2,
            Self::List => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Auto),
            1 => Some(Self::Fan),
            2 => Some(Self::Grid),
            3 => Some(Self::List),
            _ => None,
        }
    }
}

/// Directory tile in the others section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryTile {
    pub path: String,
    #[serde(default)]
    pub arrangement: Arrangement,
    #[serde(default)]
    pub display_as: DisplayAs,
    #[serde(default)]
    pub show_as: ShowAs,
}

/// Pinned document in the others section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileTile {
    pub file: String,
}

/// URL bookmark tile in the others section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UrlTile {
    pub url: String,
    pub label: String,
}

/// Entry of the others section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DockTile {
    Directory(DirectoryTile),
    File(FileTile),
    Url(UrlTile),
}

impl DockTile {
    pub fn directory(path: impl Into<String>) -> Self {
        Self::Directory(DirectoryTile {
            path: path.into(),
            arrangement: Arrangement::default(),
            display_as: DisplayAs::default(),
            show_as: ShowAs::default(),
        })
    }

    pub fn file(file: impl Into<String>) -> Self {
        Self::File(FileTile { file: file.into() })
    }

    pub fn url(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Url(UrlTile {
            url: url.into(),
            label: label.into(),
        })
    }
}

/// Desired or current Dock content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockLayout {
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub others: Vec<DockTile>,
}

impl DockLayout {
    /// Returns a copy with app and directory paths normalized.
    pub fn normalized(&self) -> DockLayout {
        DockLayout {
            apps: self
                .apps
                .iter()
                .map(|app| normalize_app_path(app))
                .collect(),
            others: self
                .others
                .iter()
                .map(|tile| match tile {
                    DockTile::Directory(directory) => DockTile::Directory(DirectoryTile {
                        path: normalize_directory_path(&directory.path),
                        ..directory.clone()
                    }),
                    DockTile::File(file) => DockTile::file(normalize_directory_path(&file.file)),
                    DockTile::Url(url) => DockTile::Url(url.clone()),
                })
                .collect(),
        }
    }
}

/// Maps a bare app name (`Safari`, `Safari.app`) to `/Applications/<name>.app`.
///
/// Absolute paths are kept; a trailing `/` is always removed.
pub fn normalize_app_path(value: &str) -> String {
    let trimmed = trim_trailing_slash(value.trim());
    if trimmed.starts_with('/') {
        return trimmed.to_string();
    }
    if trimmed.ends_with(".app") {
        format!("{APPLICATIONS_DIR}/{trimmed}")
    } else {
        format!("{APPLICATIONS_DIR}/{trimmed}.app")
    }
}

/// Expands a leading `~` to the home directory and removes a trailing `/`.
///
/// Used for directory and document tiles alike.
pub fn normalize_directory_path(value: &str) -> String {
    let trimmed = trim_trailing_slash(value.trim());
    let rest = match trimmed.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return trimmed.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{rest}", home.to_string_lossy().trim_end_matches('/')),
        None => trimmed.to_string(),
    }
}

/// Display label of a path: the last component without an `.app` suffix.
pub fn path_label(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    match name.strip_suffix(".app") {
        Some(stem) => stem.to_string(),
        None => name,
    }
}

fn trim_trailing_slash(value: &str) -> &str {
    let trimmed = value.trim_end_matches('/');
    if trimmed.is_empty() && value.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}
