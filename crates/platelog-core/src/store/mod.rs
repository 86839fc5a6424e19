//! Interfaces to the external event and saved-order stores.
//!
//! The ranking engine never performs I/O itself. Callers read an event
//! snapshot through [`EventSource`] and a [`SavedOrders`] snapshot through
//! [`OrderStore`], then hand both to the pure aggregation functions.

pub mod memory;

use std::collections::HashMap;

use crate::calendar::DateRange;
use crate::error::ErrorCode;
use crate::model::{Event, EventId};
use crate::period::PeriodKey;

pub use memory::MemoryStore;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not serve a read.
    #[error("store read failed: {0}")]
    Read(#[source] BoxError),

    /// The backend rejected or lost a write.
    #[error("store write failed: {0}")]
    Write(#[source] BoxError),

    /// A stored record could not be decoded.
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Wrap any backend error as a read failure.
    pub fn read(err: impl Into<BoxError>) -> Self {
        Self::Read(err.into())
    }

    /// Wrap any backend error as a write failure.
    pub fn write(err: impl Into<BoxError>) -> Self {
        Self::Write(err.into())
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read(_) | Self::Sqlite(_) => ErrorCode::StoreReadFailed,
            Self::Write(_) => ErrorCode::OrderWriteFailed,
            Self::Corrupt { .. } => ErrorCode::CorruptRecord,
        }
    }
}

/// Source of log entries.
pub trait EventSource {
    /// Events whose date lies in `range`, both bounds inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend read fails.
    fn events_in_range(&self, range: &DateRange) -> Result<Vec<Event>, StoreError>;
}

/// Persistence for manual rank orders, keyed by [`PeriodKey`].
pub trait OrderStore {
    /// Saved order for `key`; an empty list when none was ever saved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend read fails.
    fn get_order(&self, key: &PeriodKey) -> Result<Vec<EventId>, StoreError>;

    /// Replace the whole saved order for `key`. Never merges with prior contents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write does not land.
    fn set_order(&self, key: &PeriodKey, ids: &[EventId]) -> Result<(), StoreError>;
}

impl<T: EventSource + ?Sized> EventSource for &T {
    fn events_in_range(&self, range: &DateRange) -> Result<Vec<Event>, StoreError> {
        (**self).events_in_range(range)
    }
}

impl<T: OrderStore + ?Sized> OrderStore for &T {
    fn get_order(&self, key: &PeriodKey) -> Result<Vec<EventId>, StoreError> {
        (**self).get_order(key)
    }

    fn set_order(&self, key: &PeriodKey, ids: &[EventId]) -> Result<(), StoreError> {
        (**self).set_order(key, ids)
    }
}

/// Immutable snapshot of saved orders for the periods one aggregation needs.
///
/// A key that is absent behaves exactly like an empty saved order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedOrders {
    orders: HashMap<PeriodKey, Vec<EventId>>,
}

impl SavedOrders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PeriodKey, ids: Vec<EventId>) {
        self.orders.insert(key, ids);
    }

    #[must_use]
    pub fn with(mut self, key: PeriodKey, ids: Vec<EventId>) -> Self {
        self.insert(key, ids);
        self
    }

    /// Saved ids for `key`, or an empty slice.
    #[must_use]
    pub fn get(&self, key: &PeriodKey) -> &[EventId] {
        self.orders.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl FromIterator<(PeriodKey, Vec<EventId>)> for SavedOrders {
    fn from_iter<I: IntoIterator<Item = (PeriodKey, Vec<EventId>)>>(iter: I) -> Self {
        Self {
            orders: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Period;

    #[test]
    fn missing_key_reads_as_empty_order() {
        let orders = SavedOrders::new();
        let key = Period::month(2024, 1).expect("month").key();
        assert!(orders.get(&key).is_empty());
    }

    #[test]
    fn snapshot_returns_inserted_ids() {
        let key = Period::year(2024).expect("year").key();
        let orders = SavedOrders::new().with(key.clone(), vec!["b".into(), "a".into()]);
        assert_eq!(orders.get(&key), &[EventId::new("b"), EventId::new("a")]);
        assert_eq!(orders.len(), 1);
    }

    #[test]
    fn error_codes_follow_failure_kind() {
        let read = StoreError::read("timeout");
        let write = StoreError::write("quota exceeded");
        let corrupt = StoreError::Corrupt {
            id: "e1".into(),
            reason: "bad date".into(),
        };
        assert_eq!(read.code(), ErrorCode::StoreReadFailed);
        assert_eq!(write.code(), ErrorCode::OrderWriteFailed);
        assert_eq!(corrupt.code(), ErrorCode::CorruptRecord);
        assert_eq!(write.to_string(), "store write failed: quota exceeded");
    }
}
