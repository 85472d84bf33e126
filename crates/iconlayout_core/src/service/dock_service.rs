//! Dock reconciliation use-case service.
//!
//! # Responsibility
//! - Reconcile a declared Dock layout against the Dock property list.
//!
//! # Invariants
//! - Declared paths are normalized before comparison and before writing.
//! - The plist is only rewritten when the normalized layouts differ.

use crate::model::dock::DockLayout;
use crate::repo::dock_repo::DockRepository;
use crate::service::validate::validate_dock_layout;
use crate::service::{ReconcileError, ReconcileResult};
use log::info;
use serde::Serialize;
use std::time::Instant;

/// Result of one Dock reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DockOutcome {
    /// Final (normalized) Dock layout.
    pub layout: DockLayout,
    /// Whether the plist was rewritten.
    pub changed: bool,
}

/// Dock service facade.
pub struct DockService<R: DockRepository> {
    repo: R,
}

impl<R: DockRepository> DockService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Reads the current Dock layout.
    pub fn extract(&self) -> ReconcileResult<DockLayout> {
        self.repo.extract().map_err(ReconcileError::StoreAccess)
    }

    /// Rewrites the Dock sections so they match `layout`, unless they already do.
    pub fn reconcile(&self, layout: &DockLayout) -> ReconcileResult<DockOutcome> {
        let started_at = Instant::now();
        info!("event=dock_reconcile module=service status=start");

        validate_dock_layout(layout)?;
        let desired = layout.normalized();
        let current = self.extract()?.normalized();

        let changed = current != desired;
        if changed {
            self.repo
                .write(&desired)
                .map_err(ReconcileError::StoreWrite)?;
        }

        info!(
            "event=dock_reconcile module=service status={} duration_ms={}",
            if changed { "ok" } else { "noop" },
            started_at.elapsed().as_millis()
        );
        Ok(DockOutcome {
            layout: desired,
            changed,
        })
    }
}
