//! Launchpad reconciliation use-case service.
//!
//! # Responsibility
//! - Reconcile declared app/widget layouts against the Launchpad store.
//! - Report entries appended because the declaration omitted them.
//!
//! # Invariants
//! - Title snapshots are taken once per call and never reused after a rebuild.
//! - After a rebuild, extraction equals the returned (normalized) layouts.

use crate::model::layout::{layouts_equal, Domain, LaunchpadLayout, Layout};
use crate::model::mapping::TitleMapping;
use crate::repo::launchpad_repo::LaunchpadRepository;
use crate::service::validate::{reconcile_extra_items, validate_layout, LAUNCHPAD_PAGE_CAPACITY};
use crate::service::{ReconcileError, ReconcileResult};
use log::{debug, info};
use serde::Serialize;
use std::time::Instant;

/// Desired Launchpad arrangement. `None` keeps the domain's current layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchpadRequest {
    pub apps: Option<Layout>,
    pub widgets: Option<Layout>,
}

/// Result of one Launchpad reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchpadOutcome {
    /// Final app layout, including appended extra pages.
    pub apps: Layout,
    /// Final widget layout, including appended extra pages.
    pub widgets: Layout,
    /// App titles appended because the declaration omitted them.
    pub extra_apps: Vec<String>,
    /// Widget titles appended because the declaration omitted them.
    pub extra_widgets: Vec<String>,
    /// Whether the store was rewritten.
    pub changed: bool,
}

/// Launchpad service facade.
pub struct LaunchpadService<R: LaunchpadRepository> {
    repo: R,
    page_capacity: usize,
}

impl<R: LaunchpadRepository> LaunchpadService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            page_capacity: LAUNCHPAD_PAGE_CAPACITY,
        }
    }

    /// Overrides how many extra icons go on one appended page.
    pub fn with_page_capacity(mut self, page_capacity: usize) -> Self {
        self.page_capacity = page_capacity.max(1);
        self
    }

    /// Reads the current arrangement of both grids.
    pub fn extract(&self) -> ReconcileResult<LaunchpadLayout> {
        self.repo.extract().map_err(ReconcileError::StoreAccess)
    }

    /// Rewrites the store so it matches `request`, unless it already does.
    ///
    /// # Errors
    /// - `Validation` when a declared title is unknown or repeated; the store
    ///   is untouched.
    /// - `StoreAccess` when the snapshot or extraction cannot be read.
    /// - `StoreWrite` when the rebuild fails; the rebuild transaction is
    ///   rolled back.
    pub fn reconcile(&self, request: &LaunchpadRequest) -> ReconcileResult<LaunchpadOutcome> {
        let started_at = Instant::now();
        info!("event=launchpad_reconcile module=service status=start");

        let apps_mapping = self
            .repo
            .title_mapping(Domain::Apps)
            .map_err(ReconcileError::StoreAccess)?;
        let widgets_mapping = self
            .repo
            .title_mapping(Domain::Widgets)
            .map_err(ReconcileError::StoreAccess)?;
        let current = self.extract()?;

        let (apps, extra_apps) = self.desired_layout(
            Domain::Apps,
            request.apps.as_ref(),
            &current.apps,
            &apps_mapping,
        )?;
        let (widgets, extra_widgets) = self.desired_layout(
            Domain::Widgets,
            request.widgets.as_ref(),
            &current.widgets,
            &widgets_mapping,
        )?;
        let desired = LaunchpadLayout { apps, widgets };

        let changed = !(layouts_equal(&desired.apps, &current.apps)
            && layouts_equal(&desired.widgets, &current.widgets));
        if changed {
            self.repo
                .rebuild(&desired, &apps_mapping, &widgets_mapping)
                .map_err(ReconcileError::StoreWrite)?;
        }

        info!(
            "event=launchpad_reconcile module=service status={} duration_ms={} extra_apps={} extra_widgets={}",
            if changed { "ok" } else { "noop" },
            started_at.elapsed().as_millis(),
            extra_apps.len(),
            extra_widgets.len()
        );

        Ok(LaunchpadOutcome {
            apps: desired.apps,
            widgets: desired.widgets,
            extra_apps,
            extra_widgets,
            changed,
        })
    }

    fn desired_layout(
        &self,
        domain: Domain,
        declared: Option<&Layout>,
        current: &Layout,
        mapping: &TitleMapping,
    ) -> ReconcileResult<(Layout, Vec<String>)> {
        let base = match declared {
            Some(layout) => {
                validate_layout(layout, mapping, domain)?;
                layout.normalized()
            }
            None => current.normalized(),
        };

        let (augmented, extra) = reconcile_extra_items(&base, mapping, self.page_capacity);
        if !extra.is_empty() {
            debug!(
                "event=extra_items module=service domain={domain} titles={:?}",
                extra
            );
        }
        Ok((augmented, extra))
    }
}
