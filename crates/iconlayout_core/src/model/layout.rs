//! Declarative icon layout model.
//!
//! # Responsibility
//! - Define the page/folder/leaf tree shared by every grid store backend.
//! - Convert raw configuration shapes into typed layouts exactly once.
//! - Provide the structural comparator used to short-circuit no-op rebuilds.
//!
//! # Invariants
//! - Folder nesting depth is exactly one: folder pages hold leaves only.
//! - Page and item order is icon grid position and is always preserved.
//! - Normalized layouts contain no empty pages at any level.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Icon domain a layout belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Launchpad application grid.
    Apps,
    /// Launchpad (dashboard) widget grid.
    Widgets,
    /// Dock application section.
    DockApps,
    /// Dock directory/URL section.
    DockOthers,
}

impl Domain {
    /// Stable lowercase name used in messages and log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Apps => "apps",
            Self::Widgets => "widgets",
            Self::DockApps => "dock_apps",
            Self::DockOthers => "dock_others",
        }
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures raised before any store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutValidationError {
    /// Leaf title does not resolve to an existing store entry.
    UnknownTitle { domain: Domain, title: String },
    /// Leaf title is placed more than once.
    DuplicateTitle { domain: Domain, title: String },
    /// Folder item has no (or a blank) `folder_title`.
    FolderMissingTitle { domain: Domain },
    /// Folder item has no `folder_layout`.
    FolderMissingLayout { domain: Domain, folder_title: String },
    /// Folder page contains another folder.
    NestedFolder { domain: Domain, folder_title: String },
    /// Dock tile at `position` has a blank path.
    EmptyPath { domain: Domain, position: usize },
    /// Dock URL tile at `position` has a blank url.
    EmptyUrl { domain: Domain, position: usize },
}

impl Display for LayoutValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTitle { domain, title } => {
                write!(f, "{domain}: unable to find title `{title}` in the store")
            }
            Self::DuplicateTitle { domain, title } => {
                write!(f, "{domain}: title `{title}` is placed more than once")
            }
            Self::FolderMissingTitle { domain } => {
                write!(f, "{domain}: folder item is missing `folder_title`")
            }
            Self::FolderMissingLayout {
                domain,
                folder_title,
            } => write!(
                f,
                "{domain}: folder `{folder_title}` is missing `folder_layout`"
            ),
            Self::NestedFolder {
                domain,
                folder_title,
            } => write!(
                f,
                "{domain}: folder `{folder_title}` contains a nested folder; only one level is supported"
            ),
            Self::EmptyPath { domain, position } => {
                write!(f, "{domain}: tile {position} has an empty path")
            }
            Self::EmptyUrl { domain, position } => {
                write!(f, "{domain}: tile {position} has an empty url")
            }
        }
    }
}

impl Error for LayoutValidationError {}

/// One icon on a grid page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Item {
    /// Reference by title to an existing store entry.
    Leaf(String),
    /// Named folder holding pages of leaves.
    Folder(Folder),
}

impl Item {
    pub fn leaf(title: impl Into<String>) -> Self {
        Self::Leaf(title.into())
    }

    pub fn folder<T: Into<String>>(title: impl Into<String>, pages: Vec<Vec<T>>) -> Self {
        Self::Folder(Folder {
            title: title.into(),
            pages: pages
                .into_iter()
                .map(|page| page.into_iter().map(Into::into).collect())
                .collect(),
        })
    }
}

/// Folder icon. Pages are restricted to leaf titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    #[serde(rename = "folder_title")]
    pub title: String,
    #[serde(rename = "folder_layout")]
    pub pages: Vec<Vec<String>>,
}

/// Ordered icons of one grid page.
pub type Page = Vec<Item>;

/// Ordered pages for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Builds a folder-free layout from page title lists.
    pub fn from_titles<T: Into<String>>(pages: Vec<Vec<T>>) -> Self {
        Self::new(
            pages
                .into_iter()
                .map(|page| page.into_iter().map(Item::leaf).collect())
                .collect(),
        )
    }

    /// Returns a copy without empty pages, at top level and inside folders.
    pub fn normalized(&self) -> Layout {
        let pages = self
            .pages
            .iter()
            .filter(|page| !page.is_empty())
            .map(|page| {
                page.iter()
                    .map(|item| match item {
                        Item::Leaf(title) => Item::Leaf(title.clone()),
                        Item::Folder(folder) => Item::Folder(Folder {
                            title: folder.title.clone(),
                            pages: folder
                                .pages
                                .iter()
                                .filter(|page| !page.is_empty())
                                .cloned()
                                .collect(),
                        }),
                    })
                    .collect()
            })
            .collect();
        Layout { pages }
    }

    /// All leaf titles in grid order, including those inside folders.
    pub fn titles(&self) -> Vec<&str> {
        let mut titles = Vec::new();
        for item in self.pages.iter().flatten() {
            match item {
                Item::Leaf(title) => titles.push(title.as_str()),
                Item::Folder(folder) => {
                    titles.extend(folder.pages.iter().flatten().map(String::as_str));
                }
            }
        }
        titles
    }

    /// Returns a copy with `pages` appended after the existing ones.
    pub fn with_trailing_pages(&self, pages: Vec<Page>) -> Layout {
        let mut combined = self.pages.clone();
        combined.extend(pages);
        Layout { pages: combined }
    }
}

/// Structural equality after normalization.
pub fn layouts_equal(left: &Layout, right: &Layout) -> bool {
    left.normalized() == right.normalized()
}

/// Current or desired arrangement of both Launchpad domains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LaunchpadLayout {
    pub apps: Layout,
    pub widgets: Layout,
}

/// Raw layout shape as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LayoutSpec(pub Vec<Vec<ItemSpec>>);

/// Raw item: either a bare title or a folder mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ItemSpec {
    Title(String),
    Folder(FolderSpec),
}

/// Raw folder mapping. Both keys are optional here so their absence can be
/// reported as a validation error rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderSpec {
    pub folder_title: Option<String>,
    pub folder_layout: Option<Vec<Vec<ItemSpec>>>,
}

impl LayoutSpec {
    /// Converts the raw shape into a typed layout for `domain`.
    ///
    /// # Errors
    /// - `FolderMissingTitle` / `FolderMissingLayout` for incomplete folders.
    /// - `NestedFolder` when a folder page contains another folder.
    pub fn into_layout(self, domain: Domain) -> Result<Layout, LayoutValidationError> {
        let mut pages = Vec::with_capacity(self.0.len());
        for page in self.0 {
            let mut items = Vec::with_capacity(page.len());
            for item in page {
                items.push(match item {
                    ItemSpec::Title(title) => Item::Leaf(title),
                    ItemSpec::Folder(folder) => Item::Folder(folder.into_folder(domain)?),
                });
            }
            pages.push(items);
        }
        Ok(Layout { pages })
    }
}

impl FolderSpec {
    fn into_folder(self, domain: Domain) -> Result<Folder, LayoutValidationError> {
        let title = match self.folder_title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err(LayoutValidationError::FolderMissingTitle { domain }),
        };
        let Some(raw_pages) = self.folder_layout else {
            return Err(LayoutValidationError::FolderMissingLayout {
                domain,
                folder_title: title,
            });
        };

        let mut pages = Vec::with_capacity(raw_pages.len());
        for raw_page in raw_pages {
            let mut page = Vec::with_capacity(raw_page.len());
            for item in raw_page {
                match item {
                    ItemSpec::Title(leaf) => page.push(leaf),
                    ItemSpec::Folder(_) => {
                        return Err(LayoutValidationError::NestedFolder {
                            domain,
                            folder_title: title,
                        });
                    }
                }
            }
            pages.push(page);
        }
        Ok(Folder { title, pages })
    }
}

#[cfg(test)]
mod tests {
    use super::{layouts_equal, Domain, Item, Layout, LayoutSpec, LayoutValidationError};

    fn parse(yaml: &str) -> LayoutSpec {
        serde_yaml::from_str(yaml).expect("layout yaml should parse")
    }

    #[test]
    fn raw_folder_item_converts_to_typed_layout() {
        let layout = parse(
            "- [Safari, {folder_title: Utils, folder_layout: [[Calculator, Weather]]}]\n",
        )
        .into_layout(Domain::Apps)
        .unwrap();

        assert_eq!(
            layout,
            Layout::new(vec![vec![
                Item::leaf("Safari"),
                Item::folder("Utils", vec![vec!["Calculator", "Weather"]]),
            ]])
        );
    }

    #[test]
    fn folder_without_title_is_rejected() {
        let err = parse("- [{folder_layout: [[Mail]]}]\n")
            .into_layout(Domain::Widgets)
            .unwrap_err();
        assert_eq!(
            err,
            LayoutValidationError::FolderMissingTitle {
                domain: Domain::Widgets
            }
        );
        assert!(err.to_string().starts_with("widgets:"));
    }

    #[test]
    fn folder_without_layout_is_rejected() {
        let err = parse("- [{folder_title: Utils}]\n")
            .into_layout(Domain::Apps)
            .unwrap_err();
        assert!(matches!(
            err,
            LayoutValidationError::FolderMissingLayout { folder_title, .. } if folder_title == "Utils"
        ));
    }

    #[test]
    fn nested_folder_is_rejected() {
        let err = parse(
            "- [{folder_title: Outer, folder_layout: [[{folder_title: Inner, folder_layout: [[Mail]]}]]}]\n",
        )
        .into_layout(Domain::Apps)
        .unwrap_err();
        assert!(matches!(
            err,
            LayoutValidationError::NestedFolder { folder_title, .. } if folder_title == "Outer"
        ));
    }

    #[test]
    fn normalization_drops_empty_pages_at_both_levels() {
        let layout = Layout::new(vec![
            vec![],
            vec![
                Item::leaf("Mail"),
                Item::folder("Utils", vec![vec![], vec!["Notes"]]),
            ],
            vec![],
        ]);

        assert_eq!(
            layout.normalized(),
            Layout::new(vec![vec![
                Item::leaf("Mail"),
                Item::folder("Utils", vec![vec!["Notes"]]),
            ]])
        );
        assert!(layouts_equal(&layout, &layout.normalized()));
    }

    #[test]
    fn titles_include_folder_leaves_in_order() {
        let layout = Layout::new(vec![vec![
            Item::leaf("Safari"),
            Item::folder("Utils", vec![vec!["Calculator"], vec!["Weather"]]),
            Item::leaf("Mail"),
        ]]);
        assert_eq!(
            layout.titles(),
            vec!["Safari", "Calculator", "Weather", "Mail"]
        );
    }
}
