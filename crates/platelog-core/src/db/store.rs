use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::calendar::DateRange;
use crate::model::{DATE_FORMAT, Event, EventId, Rating};
use crate::period::PeriodKey;
use crate::store::{EventSource, OrderStore, StoreError};

/// Event and saved-order store on a single SQLite connection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Columns of one `events` row before validation.
struct RawEvent {
    id: String,
    date: String,
    slot: String,
    rating: Option<i64>,
    name: Option<String>,
    kind: Option<String>,
    fields_json: String,
}

impl RawEvent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            slot: row.get("slot")?,
            rating: row.get("rating")?,
            name: row.get("name")?,
            kind: row.get("kind")?,
            fields_json: row.get("fields_json")?,
        })
    }

    fn decode(self) -> Result<Event, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            id: self.id.clone(),
            reason,
        };

        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|e| corrupt(format!("date '{}': {e}", self.date)))?;
        let rating = self
            .rating
            .map(Rating::try_from)
            .transpose()
            .map_err(|e| corrupt(e.to_string()))?;
        let fields: BTreeMap<String, String> = serde_json::from_str(&self.fields_json)
            .map_err(|e| corrupt(format!("fields_json: {e}")))?;

        Ok(Event {
            id: EventId::new(self.id),
            date,
            slot: self.slot,
            rating,
            name: self.name,
            kind: self.kind,
            fields,
        })
    }
}

impl SqliteStore {
    /// Open a file-backed store, creating and migrating it as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(super::open_connection(path)?))
    }

    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(super::open_in_memory()?))
    }

    /// Wrap an already-migrated connection.
    #[must_use]
    pub const fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }

    /// Insert or overwrite an event row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the row cannot be written.
    pub fn upsert_event(&self, event: &Event) -> Result<(), StoreError> {
        let fields_json = serde_json::to_string(&event.fields).map_err(StoreError::write)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (id, date, slot, rating, name, kind, fields_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    date = excluded.date,
                    slot = excluded.slot,
                    rating = excluded.rating,
                    name = excluded.name,
                    kind = excluded.kind,
                    fields_json = excluded.fields_json",
                params![
                    event.id.as_str(),
                    event.date_iso(),
                    event.slot,
                    event.rating.map(Rating::get),
                    event.name,
                    event.kind,
                    fields_json,
                ],
            )
        })
        .map_err(StoreError::write)?;
        Ok(())
    }

    /// Delete an event row. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the delete fails.
    pub fn delete_event(&self, id: &EventId) -> Result<bool, StoreError> {
        let removed = self
            .with_conn(|conn| conn.execute("DELETE FROM events WHERE id = ?1", [id.as_str()]))
            .map_err(StoreError::write)?;
        Ok(removed > 0)
    }

    /// Timestamp (RFC 3339) of the last `set_order` for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the query fails.
    pub fn order_updated_at(&self, key: &PeriodKey) -> Result<Option<String>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT updated_at FROM rank_orders WHERE period_key = ?1",
                [key.as_str()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
        })
        .map(Option::flatten)
        .map_err(StoreError::read)
    }
}

impl EventSource for SqliteStore {
    fn events_in_range(&self, range: &DateRange) -> Result<Vec<Event>, StoreError> {
        let start = range.start.format(DATE_FORMAT).to_string();
        let end = range.end.format(DATE_FORMAT).to_string();

        let rows = self
            .with_conn(|conn| {
                let mut stmt = conn.prepare_cached(
                    "SELECT id, date, slot, rating, name, kind, fields_json
                     FROM events
                     WHERE date BETWEEN ?1 AND ?2
                     ORDER BY date, id",
                )?;
                let rows = stmt
                    .query_map(params![start, end], RawEvent::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok::<_, rusqlite::Error>(rows)
            })
            .map_err(StoreError::read)?;

        let mut events = Vec::with_capacity(rows.len());
        for raw in rows {
            match raw.decode() {
                Ok(event) => events.push(event),
                Err(err) => tracing::warn!(
                    code = %err.code(),
                    hint = err.code().hint().unwrap_or_default(),
                    "skipping event row: {err}"
                ),
            }
        }
        Ok(events)
    }
}

impl OrderStore for SqliteStore {
    fn get_order(&self, key: &PeriodKey) -> Result<Vec<EventId>, StoreError> {
        let raw: Option<String> = self
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT ids_json FROM rank_orders WHERE period_key = ?1",
                    [key.as_str()],
                    |row| row.get(0),
                )
                .optional()
            })
            .map_err(StoreError::read)?;

        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            id: key.to_string(),
            reason: format!("ids_json: {e}"),
        })
    }

    fn set_order(&self, key: &PeriodKey, ids: &[EventId]) -> Result<(), StoreError> {
        let ids_json = serde_json::to_string(ids).map_err(StoreError::write)?;
        let updated_at = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rank_orders (period_key, ids_json, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(period_key) DO UPDATE SET
                    ids_json = excluded.ids_json,
                    updated_at = excluded.updated_at",
                params![key.as_str(), ids_json, updated_at],
            )
        })
        .map_err(StoreError::write)?;
        tracing::debug!(key = %key, len = ids.len(), "replaced saved order");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::month_range;
    use crate::period::Period;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("open store")
    }

    #[test]
    fn upsert_then_read_back_by_range() {
        let store = store();
        let event = Event::new("e1", day(2024, 2, 10), "lunch")
            .with_rating(Rating::new(5).expect("rating"))
            .with_name("udon")
            .with_field("place", "station");
        store.upsert_event(&event).expect("upsert");
        store
            .upsert_event(&Event::new("e2", day(2024, 3, 1), "dinner"))
            .expect("upsert");

        let feb = month_range(2024, 2).expect("feb");
        let events = store.events_in_range(&feb).expect("read");
        assert_eq!(events, vec![event]);
    }

    #[test]
    fn corrupt_rows_are_skipped() {
        let store = store();
        store
            .upsert_event(&Event::new("ok", day(2024, 2, 1), "lunch"))
            .expect("upsert");
        store.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (id, date, slot, fields_json)
                 VALUES ('bad', '2024-02-0x', 'lunch', '{}')",
                [],
            )
            .expect("insert corrupt row");
        });

        let feb = month_range(2024, 2).expect("feb");
        let events = store.events_in_range(&feb).expect("read");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id.as_str(), "ok");
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let store = store();
        store
            .upsert_event(&Event::new("e1", day(2024, 2, 1), "lunch"))
            .expect("upsert");
        assert!(store.delete_event(&EventId::new("e1")).expect("delete"));
        assert!(!store.delete_event(&EventId::new("e1")).expect("delete"));
    }

    #[test]
    fn set_order_overwrites_and_stamps_time() {
        let store = store();
        let key = Period::week(2024, 2, 3).expect("week").key();
        assert!(store.get_order(&key).expect("read").is_empty());
        assert_eq!(store.order_updated_at(&key).expect("read"), None);

        store
            .set_order(&key, &["a".into(), "b".into()])
            .expect("write");
        store.set_order(&key, &["b".into()]).expect("write");

        assert_eq!(store.get_order(&key).expect("read"), vec![EventId::new("b")]);
        assert!(store.order_updated_at(&key).expect("read").is_some());
    }

    #[test]
    fn corrupt_saved_order_surfaces_as_error() {
        let store = store();
        store.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rank_orders (period_key, ids_json) VALUES ('year_2024', 'nope')",
                [],
            )
            .expect("insert corrupt order");
        });
        let key = Period::year(2024).expect("year").key();
        let err = store.get_order(&key).expect_err("corrupt order");
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
