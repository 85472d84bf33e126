//! Use-case services for icon layout reconciliation.
//!
//! # Responsibility
//! - Orchestrate validate → reconcile extras → compare → rebuild per store.
//! - Classify failures into validation, store-access and store-write errors.
//!
//! # Invariants
//! - Validation always completes before the first store write.
//! - A layout equal to the current extraction causes no store write.
//! - No operation is retried.

use crate::model::layout::LayoutValidationError;
use crate::repo::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dock_service;
pub mod launchpad_service;
pub mod validate;

/// Result type used by reconciliation services.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors from one reconciliation call.
#[derive(Debug)]
pub enum ReconcileError {
    /// Declared layout is invalid; the store was not touched.
    Validation(LayoutValidationError),
    /// Store could not be opened, read or parsed.
    StoreAccess(StoreError),
    /// Store write failed.
    StoreWrite(StoreError),
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::StoreAccess(err) => write!(f, "unable to read store: {err}"),
            Self::StoreWrite(err) => write!(f, "unable to write store: {err}"),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StoreAccess(err) => Some(err),
            Self::StoreWrite(err) => Some(err),
        }
    }
}

impl From<LayoutValidationError> for ReconcileError {
    fn from(value: LayoutValidationError) -> Self {
        Self::Validation(value)
    }
}
