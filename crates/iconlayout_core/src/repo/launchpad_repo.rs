//! Launchpad store contract and SQLite implementation.
//!
//! # Responsibility
//! - Resolve app/widget titles to their `items` rows.
//! - Walk parent-indexed rows back into nested layouts.
//! - Rewrite every structural row (roots, pages, folders) from a layout.
//!
//! # Invariants
//! - Entry rows (apps, widgets) are relocated, never inserted or deleted.
//! - Structural ids are allocated above every surviving row id.
//! - A rebuild is one `IMMEDIATE` transaction; order-maintenance triggers are
//!   suppressed only inside it, so any failure rolls back rows and flag alike.
//! - Child order is read from `ordering`, never from `rowid`.
//! - Entry rows without a title (e.g. downloads in progress) are not layout
//!   items: extraction skips them and a rebuild parks them on the holding page.

use crate::model::layout::{Domain, Folder, Item, LaunchpadLayout, Layout, Page};
use crate::model::mapping::{ItemType, StoreEntry, TitleMapping};
use crate::repo::{StoreError, StoreResult};
use log::{debug, error, info, warn};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use std::time::Instant;
use uuid::Uuid;

/// Root row of the application grid.
pub const APPS_ROOT_ID: i64 = 1;
/// Root row of the widget grid.
pub const WIDGETS_ROOT_ID: i64 = 3;

/// Holding page of the application grid.
const APPS_HOLDING_PAGE_ID: i64 = 2;
/// Holding page of the widget grid.
const WIDGETS_HOLDING_PAGE_ID: i64 = 4;

/// Well-known rows re-created on every rebuild: `(rowid, uuid, type, parent_id)`.
const FIXED_ROWS: [(i64, &str, ItemType, i64); 6] = [
    (1, "ROOTPAGE", ItemType::Root, 0),
    (2, "HOLDINGPAGE", ItemType::Page, 1),
    (3, "ROOTPAGE_DB", ItemType::Root, 0),
    (4, "HOLDINGPAGE_DB", ItemType::Page, 3),
    (5, "ROOTPAGE_VERS", ItemType::Root, 0),
    (6, "HOLDINGPAGE_VERS", ItemType::Page, 5),
];

const HOLDING_PAGE_PREFIX: &str = "HOLDINGPAGE";
const TRIGGER_FLAG_KEY: &str = "ignore_items_update_triggers";
const APPS_ROOT_KEY: &str = "launchpad_root";
const WIDGETS_ROOT_KEY: &str = "dashboard_root";
const STRUCTURAL_FLAGS: i64 = 0;

/// Repository interface for the Launchpad store.
pub trait LaunchpadRepository {
    /// Reads the title → entry snapshot for `Domain::Apps` or `Domain::Widgets`.
    fn title_mapping(&self, domain: Domain) -> StoreResult<TitleMapping>;
    /// Reads the current arrangement of both grids.
    fn extract(&self) -> StoreResult<LaunchpadLayout>;
    /// Replaces every structural row so the store reflects `layout`.
    ///
    /// Every leaf title in `layout` must be present in the matching mapping.
    fn rebuild(
        &self,
        layout: &LaunchpadLayout,
        apps: &TitleMapping,
        widgets: &TitleMapping,
    ) -> StoreResult<()>;
}

/// SQLite-backed Launchpad repository.
pub struct SqliteLaunchpadRepository<'conn> {
    conn: &'conn Connection,
    has_widgets: bool,
}

impl<'conn> SqliteLaunchpadRepository<'conn> {
    /// Creates repository after checking the Launchpad schema is present.
    ///
    /// The `widgets` table is optional; without it the widget grid is empty.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_launchpad_schema(conn)?;
        let has_widgets = table_exists(conn, "widgets")?;
        if has_widgets {
            ensure_columns(conn, "widgets", &["item_id", "title"])?;
        }
        Ok(Self { conn, has_widgets })
    }
}

impl LaunchpadRepository for SqliteLaunchpadRepository<'_> {
    fn title_mapping(&self, domain: Domain) -> StoreResult<TitleMapping> {
        let table = match domain {
            Domain::Apps => "apps",
            Domain::Widgets if self.has_widgets => "widgets",
            Domain::Widgets => return Ok(TitleMapping::new()),
            other => {
                return Err(StoreError::InvalidData(format!(
                    "domain `{other}` is not stored in Launchpad"
                )));
            }
        };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT
                {table}.item_id,
                {table}.title,
                items.uuid,
                items.flags,
                items.type
             FROM {table}
             INNER JOIN items ON items.rowid = {table}.item_id
             WHERE {table}.title IS NOT NULL
             ORDER BY {table}.item_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;

        let mut mapping = TitleMapping::new();
        while let Some(row) = rows.next()? {
            let item_id: i64 = row.get(0)?;
            let title: String = row.get(1)?;
            let item_type = parse_item_type(row.get(4)?, item_id)?;
            if item_type.is_structural() {
                return Err(StoreError::InvalidData(format!(
                    "{table} entry {item_id} points at structural item type {}",
                    item_type.code()
                )));
            }
            let entry = StoreEntry {
                item_id,
                uuid: row.get(2)?,
                flags: row.get(3)?,
                item_type,
            };
            if !mapping.insert(title, entry) {
                warn!(
                    "event=title_mapping module=repo status=duplicate domain={domain} item_id={item_id}"
                );
            }
        }

        debug!(
            "event=title_mapping module=repo status=ok domain={domain} entries={} max_item_id={}",
            mapping.len(),
            mapping.max_item_id()
        );
        Ok(mapping)
    }

    fn extract(&self) -> StoreResult<LaunchpadLayout> {
        let children = load_children_by_parent(self.conn, self.has_widgets)?;
        let apps_root = read_dbinfo_id(self.conn, APPS_ROOT_KEY)?.unwrap_or(APPS_ROOT_ID);
        let widgets_root = read_dbinfo_id(self.conn, WIDGETS_ROOT_KEY)?.unwrap_or(WIDGETS_ROOT_ID);

        Ok(LaunchpadLayout {
            apps: extract_domain(&children, apps_root)?,
            widgets: extract_domain(&children, widgets_root)?,
        })
    }

    fn rebuild(
        &self,
        layout: &LaunchpadLayout,
        apps: &TitleMapping,
        widgets: &TitleMapping,
    ) -> StoreResult<()> {
        let started_at = Instant::now();
        info!(
            "event=launchpad_rebuild module=repo status=start apps_pages={} widgets_pages={}",
            layout.apps.pages.len(),
            layout.widgets.pages.len()
        );

        let result = rebuild_in_transaction(self.conn, layout, apps, widgets);
        match &result {
            Ok(()) => info!(
                "event=launchpad_rebuild module=repo status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=launchpad_rebuild module=repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

/// Running allocator for page and folder-root row ids.
struct StructuralIds {
    last: i64,
}

impl StructuralIds {
    fn starting_after(floor: i64) -> Self {
        Self { last: floor }
    }

    fn next(&mut self) -> i64 {
        self.last += 1;
        self.last
    }
}

fn rebuild_in_transaction(
    conn: &Connection,
    layout: &LaunchpadLayout,
    apps: &TitleMapping,
    widgets: &TitleMapping,
) -> StoreResult<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    with_item_triggers_suppressed(&tx, |conn| {
        clear_structural_rows(conn)?;
        insert_fixed_rows(conn)?;

        let floor = max_row_id(conn)?
            .max(apps.max_item_id())
            .max(widgets.max_item_id());
        let mut ids = StructuralIds::starting_after(floor);
        write_domain(conn, Domain::Apps, &layout.apps, apps, APPS_ROOT_ID, &mut ids)?;
        write_domain(
            conn,
            Domain::Widgets,
            &layout.widgets,
            widgets,
            WIDGETS_ROOT_ID,
            &mut ids,
        )?;

        park_unplaced_entries(conn)?;
        write_dbinfo(conn, APPS_ROOT_KEY, APPS_ROOT_ID)?;
        write_dbinfo(conn, WIDGETS_ROOT_KEY, WIDGETS_ROOT_ID)?;
        Ok(())
    })?;
    tx.commit()?;
    Ok(())
}

/// Runs `body` with the store's order-maintenance triggers disabled.
///
/// Must run inside a transaction: on error the flag write is rolled back
/// together with every row written by `body`.
fn with_item_triggers_suppressed<T>(
    conn: &Connection,
    body: impl FnOnce(&Connection) -> StoreResult<T>,
) -> StoreResult<T> {
    write_dbinfo(conn, TRIGGER_FLAG_KEY, 1)?;
    let value = body(conn)?;
    write_dbinfo(conn, TRIGGER_FLAG_KEY, 0)?;
    Ok(value)
}

fn clear_structural_rows(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "DELETE FROM items WHERE type IN (?1, ?2, ?3);",
        params![
            ItemType::Root.code(),
            ItemType::FolderRoot.code(),
            ItemType::Page.code(),
        ],
    )?;
    conn.execute("DELETE FROM \"groups\";", [])?;
    Ok(())
}

fn insert_fixed_rows(conn: &Connection) -> StoreResult<()> {
    for (rowid, uuid, item_type, parent_id) in FIXED_ROWS {
        conn.execute(
            "INSERT INTO items (rowid, uuid, flags, type, parent_id, ordering)
             VALUES (?1, ?2, NULL, ?3, ?4, 0);",
            params![rowid, uuid, item_type.code(), parent_id],
        )?;
        conn.execute(
            "INSERT INTO \"groups\" (item_id, category_id, title) VALUES (?1, NULL, NULL);",
            [rowid],
        )?;
    }
    Ok(())
}

fn write_domain(
    conn: &Connection,
    domain: Domain,
    layout: &Layout,
    mapping: &TitleMapping,
    root_id: i64,
    ids: &mut StructuralIds,
) -> StoreResult<()> {
    for (page_index, page) in layout.pages.iter().enumerate() {
        let page_id = ids.next();
        // Ordering 0 under each root belongs to the holding page.
        insert_structural_row(
            conn,
            page_id,
            ItemType::Page,
            root_id,
            page_index as i64 + 1,
            None,
        )?;

        for (position, item) in page.iter().enumerate() {
            match item {
                Item::Leaf(title) => {
                    place_entry(conn, domain, mapping, title, page_id, position as i64)?;
                }
                Item::Folder(folder) => {
                    let folder_id = ids.next();
                    insert_structural_row(
                        conn,
                        folder_id,
                        ItemType::FolderRoot,
                        page_id,
                        position as i64,
                        Some(folder.title.as_str()),
                    )?;
                    for (folder_page_index, leaves) in folder.pages.iter().enumerate() {
                        let folder_page_id = ids.next();
                        insert_structural_row(
                            conn,
                            folder_page_id,
                            ItemType::Page,
                            folder_id,
                            folder_page_index as i64,
                            None,
                        )?;
                        for (leaf_position, title) in leaves.iter().enumerate() {
                            place_entry(
                                conn,
                                domain,
                                mapping,
                                title,
                                folder_page_id,
                                leaf_position as i64,
                            )?;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn insert_structural_row(
    conn: &Connection,
    rowid: i64,
    item_type: ItemType,
    parent_id: i64,
    ordering: i64,
    group_title: Option<&str>,
) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO items (rowid, uuid, flags, type, parent_id, ordering)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            rowid,
            Uuid::new_v4().to_string().to_uppercase(),
            STRUCTURAL_FLAGS,
            item_type.code(),
            parent_id,
            ordering,
        ],
    )?;
    conn.execute(
        "INSERT INTO \"groups\" (item_id, category_id, title) VALUES (?1, NULL, ?2);",
        params![rowid, group_title],
    )?;
    Ok(())
}

fn place_entry(
    conn: &Connection,
    domain: Domain,
    mapping: &TitleMapping,
    title: &str,
    parent_id: i64,
    ordering: i64,
) -> StoreResult<()> {
    let entry = mapping.get(title).ok_or_else(|| {
        StoreError::InvalidData(format!("{domain} title `{title}` is missing from snapshot"))
    })?;
    let changed = conn.execute(
        "UPDATE items
         SET uuid = ?2,
             flags = ?3,
             type = ?4,
             parent_id = ?5,
             ordering = ?6
         WHERE rowid = ?1;",
        params![
            entry.item_id,
            entry.uuid,
            entry.flags,
            entry.item_type.code(),
            parent_id,
            ordering,
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::EntryVanished {
            item_id: entry.item_id,
            title: title.to_string(),
        });
    }
    Ok(())
}

/// Moves entry rows whose parent no longer exists onto their grid's holding page.
fn park_unplaced_entries(conn: &Connection) -> StoreResult<()> {
    let parked = conn.execute(
        "UPDATE items
         SET parent_id = CASE WHEN type = ?1 THEN ?2 ELSE ?3 END,
             ordering = 0
         WHERE type IN (?4, ?5, ?1)
           AND parent_id NOT IN (SELECT rowid FROM items);",
        params![
            ItemType::Widget.code(),
            WIDGETS_HOLDING_PAGE_ID,
            APPS_HOLDING_PAGE_ID,
            ItemType::App.code(),
            ItemType::DownloadingApp.code(),
        ],
    )?;
    if parked > 0 {
        warn!("event=launchpad_rebuild module=repo status=parked entries={parked}");
    }
    Ok(())
}

fn max_row_id(conn: &Connection) -> StoreResult<i64> {
    let max: i64 = conn.query_row("SELECT COALESCE(MAX(rowid), 0) FROM items;", [], |row| {
        row.get(0)
    })?;
    Ok(max)
}

/// One `items` row joined with its title source.
struct ItemRow {
    rowid: i64,
    uuid: Option<String>,
    item_type: ItemType,
    title: Option<String>,
}

impl ItemRow {
    fn is_holding_page(&self) -> bool {
        self.uuid
            .as_deref()
            .is_some_and(|uuid| uuid.starts_with(HOLDING_PAGE_PREFIX))
    }

    /// Title of an entry row, or `None` (logged) when no title row backs it.
    fn leaf_title(&self) -> Option<String> {
        if self.title.is_none() {
            warn!(
                "event=launchpad_extract module=repo status=skip item_id={} item_type={} reason=untitled",
                self.rowid,
                self.item_type.code()
            );
        }
        self.title.clone()
    }
}

type ChildrenByParent = BTreeMap<i64, Vec<ItemRow>>;

fn load_children_by_parent(conn: &Connection, has_widgets: bool) -> StoreResult<ChildrenByParent> {
    let (widget_column, widget_join) = if has_widgets {
        (
            "widgets.title",
            "LEFT JOIN widgets ON widgets.item_id = items.rowid",
        )
    } else {
        ("NULL", "")
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT
            items.rowid,
            items.uuid,
            items.type,
            items.parent_id,
            apps.title,
            {widget_column},
            g.title
         FROM items
         LEFT JOIN apps ON apps.item_id = items.rowid
         {widget_join}
         LEFT JOIN \"groups\" g ON g.item_id = items.rowid
         ORDER BY items.parent_id ASC, items.ordering ASC, items.rowid ASC;"
    ))?;
    let mut rows = stmt.query([])?;

    let mut children = ChildrenByParent::new();
    while let Some(row) = rows.next()? {
        let rowid: i64 = row.get(0)?;
        let item_type = parse_item_type(row.get(2)?, rowid)?;
        let parent_id: i64 = row.get(3)?;
        let title: Option<String> = match item_type {
            ItemType::App | ItemType::DownloadingApp => row.get(4)?,
            ItemType::Widget => row.get(5)?,
            ItemType::FolderRoot => row.get(6)?,
            ItemType::Root | ItemType::Page => None,
        };
        children.entry(parent_id).or_default().push(ItemRow {
            rowid,
            uuid: row.get(1)?,
            item_type,
            title,
        });
    }
    Ok(children)
}

fn child_rows(children: &ChildrenByParent, parent_id: i64) -> &[ItemRow] {
    children.get(&parent_id).map(Vec::as_slice).unwrap_or(&[])
}

fn extract_domain(children: &ChildrenByParent, root_id: i64) -> StoreResult<Layout> {
    let mut pages = Vec::new();
    for page_row in child_rows(children, root_id) {
        if page_row.item_type != ItemType::Page || page_row.is_holding_page() {
            continue;
        }
        let page = extract_page(children, page_row.rowid)?;
        if !page.is_empty() {
            pages.push(page);
        }
    }
    Ok(Layout::new(pages))
}

fn extract_page(children: &ChildrenByParent, page_id: i64) -> StoreResult<Page> {
    let mut items = Vec::new();
    for row in child_rows(children, page_id) {
        match row.item_type {
            ItemType::App | ItemType::DownloadingApp | ItemType::Widget => {
                if let Some(title) = row.leaf_title() {
                    items.push(Item::Leaf(title));
                }
            }
            ItemType::FolderRoot => items.push(Item::Folder(extract_folder(children, row)?)),
            ItemType::Root | ItemType::Page => {
                return Err(StoreError::InvalidData(format!(
                    "page {page_id} contains structural item {}",
                    row.rowid
                )));
            }
        }
    }
    Ok(items)
}

fn extract_folder(children: &ChildrenByParent, folder: &ItemRow) -> StoreResult<Folder> {
    let mut pages = Vec::new();
    for page_row in child_rows(children, folder.rowid) {
        if page_row.item_type != ItemType::Page {
            return Err(StoreError::InvalidData(format!(
                "folder {} contains non-page item {}",
                folder.rowid, page_row.rowid
            )));
        }
        let mut leaves = Vec::new();
        for row in child_rows(children, page_row.rowid) {
            match row.item_type {
                ItemType::App | ItemType::DownloadingApp | ItemType::Widget => {
                    leaves.extend(row.leaf_title());
                }
                _ => {
                    return Err(StoreError::InvalidData(format!(
                        "folder {} page {} contains nested structural item {}",
                        folder.rowid, page_row.rowid, row.rowid
                    )));
                }
            }
        }
        if !leaves.is_empty() {
            pages.push(leaves);
        }
    }
    Ok(Folder {
        title: folder.title.clone().unwrap_or_default(),
        pages,
    })
}

fn parse_item_type(code: i64, rowid: i64) -> StoreResult<ItemType> {
    ItemType::from_code(code).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid item type `{code}` for item {rowid}"))
    })
}

fn read_dbinfo_id(conn: &Connection, key: &str) -> StoreResult<Option<i64>> {
    let value: Option<Value> = conn
        .query_row("SELECT value FROM dbinfo WHERE key = ?1;", [key], |row| {
            row.get(0)
        })
        .optional()?;

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Integer(id)) => Ok(Some(id)),
        Some(Value::Text(text)) => text.trim().parse::<i64>().map(Some).map_err(|_| {
            StoreError::InvalidData(format!("dbinfo `{key}` is not an integer: `{text}`"))
        }),
        Some(other) => Err(StoreError::InvalidData(format!(
            "dbinfo `{key}` has unexpected value {other:?}"
        ))),
    }
}

fn write_dbinfo(conn: &Connection, key: &str, value: i64) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE dbinfo SET value = ?2 WHERE key = ?1;",
        params![key, value],
    )?;
    if changed == 0 {
        conn.execute(
            "INSERT INTO dbinfo (key, value) VALUES (?1, ?2);",
            params![key, value],
        )?;
    }
    Ok(())
}

fn ensure_launchpad_schema(conn: &Connection) -> StoreResult<()> {
    ensure_columns(
        conn,
        "items",
        &["rowid", "uuid", "flags", "type", "parent_id", "ordering"],
    )?;
    ensure_columns(conn, "groups", &["item_id", "category_id", "title"])?;
    ensure_columns(conn, "apps", &["item_id", "title"])?;
    ensure_columns(conn, "dbinfo", &["key", "value"])?;
    Ok(())
}

fn ensure_columns(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> StoreResult<()> {
    if !table_exists(conn, table)? {
        return Err(StoreError::MissingRequiredTable(table));
    }
    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(StoreError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\");"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
