use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use super::rating::Rating;

/// ISO calendar date format used for every date string platelog emits.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Opaque identifier of a log entry, assigned by the event store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single dated log entry (a meal, snack, or diary note).
///
/// Events are owned by the external event store. The engine only reads
/// snapshots of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub date: NaiveDate,
    /// Time-of-day bucket, e.g. `breakfast` or `snack`.
    pub slot: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    /// Content name, e.g. the dish that was eaten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Remaining categorical fields (place, category, satiety, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl Event {
    /// Minimal event with no rating, labels, or categorical fields.
    pub fn new(id: impl Into<EventId>, date: NaiveDate, slot: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date,
            slot: slot.into(),
            rating: None,
            name: None,
            kind: None,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The zero-padded `YYYY-MM-DD` form of [`Event::date`].
    #[must_use]
    pub fn date_iso(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Rating as a plain number, `0` when the entry is unrated.
    #[must_use]
    pub fn rating_value(&self) -> u8 {
        self.rating.map_or(0, Rating::get)
    }

    /// Resolve a categorical value by field key.
    ///
    /// `rating`, `slot`, `name`, and `type`/`kind` map onto the dedicated
    /// fields; any other key is looked up in [`Event::fields`]. Empty values
    /// are reported as `None`.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<Cow<'_, str>> {
        let value = match key {
            "rating" => self.rating.map(|r| Cow::Owned(r.to_string())),
            "slot" => Some(Cow::Borrowed(self.slot.as_str())),
            "name" => self.name.as_deref().map(Cow::Borrowed),
            "type" | "kind" => self.kind.as_deref().map(Cow::Borrowed),
            other => self.fields.get(other).map(|v| Cow::Borrowed(v.as_str())),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// First non-empty of the content name and the type field.
    #[must_use]
    pub fn primary_label(&self) -> &str {
        [self.name.as_deref(), self.kind.as_deref()]
            .into_iter()
            .flatten()
            .find(|label| !label.is_empty())
            .unwrap_or("")
    }

    /// Key identifying the same logical item across nested period rollups.
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey(format!(
            "{}_{}_{}",
            self.primary_label(),
            self.date_iso(),
            self.slot
        ))
    }
}

/// `{primaryLabel}_{date}_{slot}`.
///
/// Two distinct entries sharing name, date, and slot produce the same key and
/// are treated as one item in rollups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey(String);

impl DedupKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
