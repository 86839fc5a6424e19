//! Versioned upgrades of the store schema.
//!
//! The applied version lives in `PRAGMA user_version` and is mirrored into
//! `store_meta.schema_version` for tools that only read tables.

use rusqlite::Connection;
use rusqlite::types::Type;

use super::schema;

/// Version a freshly migrated store reports.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// Upgrade steps in order. Step `n` takes a store from version `n - 1` to `n`.
const STEPS: [(u32, &str); 2] = [(1, schema::MIGRATION_V1_SQL), (2, schema::MIGRATION_V2_SQL)];

/// Schema version recorded in the store; `0` for an empty database.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read or holds a value outside
/// `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let raw: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(err)))
}

/// Apply every step newer than the recorded version and return the version
/// the store ends at.
///
/// Each step commits on its own, so a failure leaves the store at the last
/// version that applied cleanly.
///
/// # Errors
///
/// Returns the error of the first step that fails.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let from = current_schema_version(conn)?;
    let mut reached = from;

    for (version, sql) in STEPS.into_iter().filter(|(version, _)| *version > from) {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "UPDATE store_meta SET schema_version = ?1 WHERE id = 1",
            [version],
        )?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        reached = version;
    }

    if reached != from {
        tracing::debug!(from, to = reached, "migrated platelog store");
    }
    Ok(reached)
}
