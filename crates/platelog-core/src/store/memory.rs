use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::calendar::DateRange;
use crate::model::{Event, EventId};
use crate::period::PeriodKey;

use super::{EventSource, OrderStore, StoreError};

/// In-process store holding events and saved orders.
///
/// Concurrent `set_order` calls on one key resolve last-write-wins.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: RwLock<BTreeMap<EventId, Event>>,
    orders: RwLock<HashMap<PeriodKey, Vec<EventId>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from an event list; later duplicates of an id win.
    #[must_use]
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        let store = Self::new();
        {
            let mut map = store.events.write().unwrap_or_else(PoisonError::into_inner);
            for event in events {
                map.insert(event.id.clone(), event);
            }
        }
        store
    }

    /// Insert or replace an event, returning the previous version.
    pub fn insert_event(&self, event: Event) -> Option<Event> {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event.id.clone(), event)
    }

    pub fn remove_event(&self, id: &EventId) -> Option<Event> {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl EventSource for MemoryStore {
    fn events_in_range(&self, range: &DateRange) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        Ok(events
            .values()
            .filter(|event| range.contains(event.date))
            .cloned()
            .collect())
    }
}

impl OrderStore for MemoryStore {
    fn get_order(&self, key: &PeriodKey) -> Result<Vec<EventId>, StoreError> {
        let orders = self.orders.read().unwrap_or_else(PoisonError::into_inner);
        Ok(orders.get(key).cloned().unwrap_or_default())
    }

    fn set_order(&self, key: &PeriodKey, ids: &[EventId]) -> Result<(), StoreError> {
        self.orders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), ids.to_vec());
        Ok(())
    }
}
