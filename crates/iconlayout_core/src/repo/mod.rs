//! Store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented access contracts for each icon store.
//! - Isolate SQLite and property-list details from service orchestration.
//!
//! # Invariants
//! - Repositories never validate layout semantics; they trust service input.
//! - Read paths reject malformed persisted state instead of masking it.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod dock_repo;
pub mod launchpad_repo;

/// Result type used by store repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from reading or writing an icon store.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Property-list decode/encode error.
    Plist(plist::Error),
    /// Store file is absent.
    StoreMissing(PathBuf),
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// An entry resolved during validation disappeared before it was written.
    EntryVanished { item_id: i64, title: String },
    /// Persisted data cannot be converted to a valid layout.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Plist(err) => write!(f, "{err}"),
            Self::StoreMissing(path) => {
                write!(f, "store file does not exist: {}", path.display())
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "store requires column `{column}` in table `{table}`")
            }
            Self::EntryVanished { item_id, title } => write!(
                f,
                "entry `{title}` (item {item_id}) disappeared from the store during rebuild"
            ),
            Self::InvalidData(message) => write!(f, "invalid store data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Plist(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::StoreMissing(path) => Self::StoreMissing(path),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<plist::Error> for StoreError {
    fn from(value: plist::Error) -> Self {
        Self::Plist(value)
    }
}
