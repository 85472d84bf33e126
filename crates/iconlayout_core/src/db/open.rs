//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open the Launchpad database file read-write without creating it.
//! - Configure connection settings required by rebuild transactions.

use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens an existing SQLite store file.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
///
/// # Errors
/// - `DbError::StoreMissing` when `path` is not an existing file.
/// - `DbError::Sqlite` when the file cannot be opened or configured.
pub fn open_store(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!("event=db_open module=db status=start");

    if !path.is_file() {
        error!(
            "event=db_open module=db status=error duration_ms={} error_code=store_missing",
            started_at.elapsed().as_millis()
        );
        return Err(DbError::StoreMissing(path.to_path_buf()));
    }

    let conn = match Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    ) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &Connection) -> DbResult<()> {
    // The OS shell may hold the file briefly while re-reading it.
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(())
}
