//! Store identity snapshot used to resolve layout titles.
//!
//! # Responsibility
//! - Describe pre-existing store entries (apps, widgets) by title.
//! - Track the highest entry id so structural ids can be allocated above it.
//!
//! # Invariants
//! - A snapshot is read once per reconciliation and is stale after any write.
//! - Entries are never fabricated; a title either maps to a stored row or is absent.

use std::collections::BTreeMap;

/// Item type codes of the Launchpad `items` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Root,
    FolderRoot,
    Page,
    App,
    DownloadingApp,
    Widget,
}

impl ItemType {
    pub fn code(self) -> i64 {
        match self {
            Self::Root => 1,
            Self::FolderRoot => 2,
            Self::Page => 3,
            Self::App => 4,
            Self::DownloadingApp => 5,
            Self::Widget => 6,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Root),
            2 => Some(Self::FolderRoot),
            3 => Some(Self::Page),
            4 => Some(Self::App),
            5 => Some(Self::DownloadingApp),
            6 => Some(Self::Widget),
            _ => None,
        }
    }

    /// Whether rows of this type only express layout, not an icon.
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Root | Self::FolderRoot | Self::Page)
    }
}

/// One pre-existing icon record.
///
/// `uuid` and `flags` are opaque and written back verbatim on relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub item_id: i64,
    pub uuid: Option<String>,
    pub flags: Option<i64>,
    pub item_type: ItemType,
}

/// Title → entry mapping for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleMapping {
    entries: BTreeMap<String, StoreEntry>,
    max_item_id: i64,
}

impl TitleMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one entry. Returns `false` and keeps the first entry when the
    /// title is already mapped.
    pub fn insert(&mut self, title: impl Into<String>, entry: StoreEntry) -> bool {
        self.max_item_id = self.max_item_id.max(entry.item_id);
        let title = title.into();
        if self.entries.contains_key(&title) {
            return false;
        }
        self.entries.insert(title, entry);
        true
    }

    pub fn get(&self, title: &str) -> Option<&StoreEntry> {
        self.entries.get(title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.entries.contains_key(title)
    }

    /// Mapped titles in byte order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest item id seen while building the snapshot, or 0.
    pub fn max_item_id(&self) -> i64 {
        self.max_item_id
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemType, StoreEntry, TitleMapping};

    fn entry(item_id: i64) -> StoreEntry {
        StoreEntry {
            item_id,
            uuid: Some(format!("uuid-{item_id}")),
            flags: Some(0),
            item_type: ItemType::App,
        }
    }

    #[test]
    fn item_type_codes_round_trip() {
        for code in 1..=6 {
            let item_type = ItemType::from_code(code).unwrap();
            assert_eq!(item_type.code(), code);
        }
        assert_eq!(ItemType::from_code(7), None);
        assert!(ItemType::Page.is_structural());
        assert!(!ItemType::Widget.is_structural());
    }

    #[test]
    fn duplicate_title_keeps_first_entry_but_tracks_max_id() {
        let mut mapping = TitleMapping::new();
        assert!(mapping.insert("Safari", entry(10)));
        assert!(!mapping.insert("Safari", entry(42)));

        assert_eq!(mapping.get("Safari").map(|e| e.item_id), Some(10));
        assert_eq!(mapping.max_item_id(), 42);
        assert_eq!(mapping.len(), 1);
    }
}
