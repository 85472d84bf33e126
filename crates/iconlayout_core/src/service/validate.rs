//! Layout validation and extra-item reconciliation.
//!
//! # Responsibility
//! - Reject declared layouts that reference unknown or repeated titles.
//! - Append store entries missing from a layout as trailing pages.
//!
//! # Invariants
//! - Validation is pure and runs before any store mutation.
//! - Extra titles are appended in byte order so batching is deterministic.

use crate::model::dock::{DirectoryTile, DockLayout, DockTile, FileTile};
use crate::model::layout::{Domain, Item, Layout, LayoutValidationError, Page};
use crate::model::mapping::TitleMapping;
use std::collections::HashSet;

/// Icons per Launchpad page used when batching extra items.
pub const LAUNCHPAD_PAGE_CAPACITY: usize = 30;

/// Checks every leaf title (top level and inside folders) against `mapping`.
///
/// # Errors
/// - `FolderMissingTitle` for a folder with a blank title.
/// - `UnknownTitle` for the first title absent from `mapping`.
/// - `DuplicateTitle` for the first title placed twice.
pub fn validate_layout(
    layout: &Layout,
    mapping: &TitleMapping,
    domain: Domain,
) -> Result<(), LayoutValidationError> {
    let mut seen = HashSet::new();
    let mut check = |title: &str| -> Result<(), LayoutValidationError> {
        if !mapping.contains(title) {
            return Err(LayoutValidationError::UnknownTitle {
                domain,
                title: title.to_string(),
            });
        }
        if !seen.insert(title.to_string()) {
            return Err(LayoutValidationError::DuplicateTitle {
                domain,
                title: title.to_string(),
            });
        }
        Ok(())
    };

    for item in layout.pages.iter().flatten() {
        match item {
            Item::Leaf(title) => check(title.as_str())?,
            Item::Folder(folder) => {
                if folder.title.trim().is_empty() {
                    return Err(LayoutValidationError::FolderMissingTitle { domain });
                }
                for title in folder.pages.iter().flatten() {
                    check(title.as_str())?;
                }
            }
        }
    }
    Ok(())
}

/// Checks Dock tiles for blank paths and urls.
pub fn validate_dock_layout(layout: &DockLayout) -> Result<(), LayoutValidationError> {
    for (position, app) in layout.apps.iter().enumerate() {
        if app.trim().is_empty() {
            return Err(LayoutValidationError::EmptyPath {
                domain: Domain::DockApps,
                position,
            });
        }
    }
    for (position, tile) in layout.others.iter().enumerate() {
        match tile {
            DockTile::Directory(DirectoryTile { path, .. }) | DockTile::File(FileTile { file: path })
                if path.trim().is_empty() =>
            {
                return Err(LayoutValidationError::EmptyPath {
                    domain: Domain::DockOthers,
                    position,
                });
            }
            DockTile::Url(url) if url.url.trim().is_empty() => {
                return Err(LayoutValidationError::EmptyUrl {
                    domain: Domain::DockOthers,
                    position,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Appends every mapped title not referenced by `layout` as trailing pages of
/// at most `page_capacity` icons.
///
/// Returns the augmented layout and the appended titles.
pub fn reconcile_extra_items(
    layout: &Layout,
    mapping: &TitleMapping,
    page_capacity: usize,
) -> (Layout, Vec<String>) {
    let referenced: HashSet<&str> = layout.titles().into_iter().collect();
    let extra: Vec<String> = mapping
        .titles()
        .filter(|title| !referenced.contains(title))
        .map(str::to_string)
        .collect();

    let pages: Vec<Page> = extra
        .chunks(page_capacity.max(1))
        .map(|batch| batch.iter().cloned().map(Item::Leaf).collect())
        .collect();
    (layout.with_trailing_pages(pages), extra)
}
