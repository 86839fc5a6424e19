//! Merging natural rankings with a user's saved manual order.
//!
//! # Precedence
//!
//! 1. Entries whose id appears in the saved order come before every entry
//!    that does not, whatever their ratings.
//! 2. Saved entries follow their position in the saved order. When an id is
//!    listed twice, its first position counts.
//! 3. Unsaved entries sort by rating descending, then date descending.
//! 4. Remaining ties keep their input order.
//!
//! The merge is a stable sort under a fixed total preorder, so applying it to
//! its own output changes nothing.

use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

use platelog_core::error::ErrorCode;
use platelog_core::{Event, EventId, OrderStore, PeriodKey, StoreError};

/// A saved-order write that did not land.
///
/// The caller keeps whatever order it already displayed and may retry.
#[derive(Debug, thiserror::Error)]
#[error("failed to save order for {key}: {source}")]
pub struct PersistenceError {
    pub key: PeriodKey,
    #[source]
    pub source: StoreError,
}

impl PersistenceError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::OrderWriteFailed
    }
}

/// A drag move that refers to positions outside the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move entry {from} to {to} in a list of {len}")]
pub struct ReorderError {
    pub from: usize,
    pub to: usize,
    pub len: usize,
}

impl ReorderError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidReorder
    }
}

fn saved_positions(saved: &[EventId]) -> HashMap<&EventId, usize> {
    let mut positions = HashMap::with_capacity(saved.len());
    for (index, id) in saved.iter().enumerate() {
        positions.entry(id).or_insert(index);
    }
    positions
}

/// Natural ordering between two entries: rating, then date, both descending.
#[must_use]
pub fn natural_cmp(a: &Event, b: &Event) -> Ordering {
    Reverse(a.rating_value())
        .cmp(&Reverse(b.rating_value()))
        .then_with(|| b.date.cmp(&a.date))
}

/// Order `candidates` by the saved order first and naturally after that.
#[must_use]
pub fn merge_order<'a>(mut candidates: Vec<&'a Event>, saved: &[EventId]) -> Vec<&'a Event> {
    if saved.is_empty() {
        candidates.sort_by(|a, b| natural_cmp(a, b));
        return candidates;
    }

    let positions = saved_positions(saved);
    candidates.sort_by(|a, b| {
        match (positions.get(&a.id), positions.get(&b.id)) {
            (Some(pa), Some(pb)) => pa.cmp(pb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => natural_cmp(a, b),
        }
    });
    candidates
}

/// Replace the saved order for `key` with `ordered_ids`.
///
/// # Errors
///
/// Returns [`PersistenceError`] when the store rejects the write.
pub fn persist_order<S: OrderStore + ?Sized>(
    store: &S,
    key: &PeriodKey,
    ordered_ids: &[EventId],
) -> Result<(), PersistenceError> {
    store.set_order(key, ordered_ids).map_err(|source| {
        let code = source.code();
        tracing::warn!(
            key = %key,
            code = %code,
            hint = code.hint().unwrap_or_default(),
            "{}: {source}",
            code.message()
        );
        PersistenceError {
            key: key.clone(),
            source,
        }
    })?;
    tracing::debug!(key = %key, len = ordered_ids.len(), "persisted manual order");
    Ok(())
}

/// Full id order after dragging the entry at `from` to position `to`.
///
/// # Errors
///
/// Returns [`ReorderError`] if either index is out of bounds.
pub fn move_entry(ids: &[EventId], from: usize, to: usize) -> Result<Vec<EventId>, ReorderError> {
    if from >= ids.len() || to >= ids.len() {
        return Err(ReorderError {
            from,
            to,
            len: ids.len(),
        });
    }

    let mut reordered = ids.to_vec();
    let moved = reordered.remove(from);
    reordered.insert(to, moved);
    Ok(reordered)
}
