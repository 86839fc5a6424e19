//! SQLite backing for [`SqliteStore`].
//!
//! Connections run in WAL mode with a 5s busy timeout. Ranking reads and a
//! `rank_orders` write may overlap on the same file.

pub mod migrations;
pub mod schema;
pub mod store;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub use store::SqliteStore;

/// How long a store connection waits on a locked database.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the store file at `path`, creating its directory on first use, and
/// bring the schema up to [`migrations::LATEST_SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns an error naming `path` when the directory, the file, the pragmas,
/// or a migration cannot be applied.
pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create platelog data directory {}", dir.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open platelog store {}", path.display()))?;
    apply_pragmas(&conn)
        .with_context(|| format!("set pragmas on {}", path.display()))?;
    migrations::migrate(&mut conn)
        .with_context(|| format!("migrate platelog store {}", path.display()))?;
    Ok(conn)
}

/// Fresh in-memory store with the full schema. Nothing survives the
/// connection.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory platelog store")?;
    migrations::migrate(&mut conn).context("migrate in-memory platelog store")?;
    Ok(conn)
}

fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    // `journal_mode` answers with the mode it ended up in; the row is discarded.
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)
}
