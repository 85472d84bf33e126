#![allow(dead_code)]

use rusqlite::{params, Connection};

const LAUNCHPAD_SCHEMA: &str = include_str!("../fixtures/launchpad_schema.sql");

/// In-memory Launchpad store with fixed root rows and no entries.
pub fn launchpad_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(LAUNCHPAD_SCHEMA).unwrap();
    conn
}

/// Adds an app entry parked on the apps holding page.
pub fn add_app(conn: &Connection, item_id: i64, title: &str) {
    add_entry(conn, "apps", 4, 2, item_id, title);
}

/// Adds a widget entry parked on the widgets holding page.
pub fn add_widget(conn: &Connection, item_id: i64, title: &str) {
    add_entry(conn, "widgets", 6, 4, item_id, title);
}

fn add_entry(
    conn: &Connection,
    table: &str,
    item_type: i64,
    parent_id: i64,
    item_id: i64,
    title: &str,
) {
    conn.execute(
        "INSERT INTO items (rowid, uuid, flags, type, parent_id, ordering)
         VALUES (?1, ?2, ?3, ?4, ?5, ?1);",
        params![item_id, entry_uuid(item_id), entry_flags(item_id), item_type, parent_id],
    )
    .unwrap();
    conn.execute(
        &format!("INSERT INTO {table} (item_id, title) VALUES (?1, ?2);"),
        params![item_id, title],
    )
    .unwrap();
}

pub fn entry_uuid(item_id: i64) -> String {
    format!("ENTRY-{item_id}")
}

pub fn entry_flags(item_id: i64) -> i64 {
    1000 + item_id
}

/// `(parent_id, ordering, type)` of one row.
pub fn placement(conn: &Connection, rowid: i64) -> (i64, i64, i64) {
    conn.query_row(
        "SELECT parent_id, ordering, type FROM items WHERE rowid = ?1;",
        [rowid],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .unwrap()
}

pub fn trigger_flag(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT CAST(value AS INTEGER) FROM dbinfo WHERE key = 'ignore_items_update_triggers';",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn count_rows(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}
