//! Categorical distributions for proportion charts.
//!
//! # Ordering
//!
//! Missing or empty values count under [`UNSPECIFIED`], which always sorts
//! last. The remaining labels are ordered by case:
//!
//! - **Allow-list given**: values outside the list are counted as
//!   unspecified. Listed values with a nonzero count appear in list order,
//!   then are stably re-sorted by count descending.
//! - **Numeric field** (e.g. `rating`, `satiety`): ascending numeric value.
//!   Labels that do not parse as numbers follow, in label order.
//! - **Other fields**: count descending; ties keep first-seen order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use platelog_core::Event;
use platelog_core::config::ProportionSection;

/// Label collecting missing, empty, and disallowed values.
pub const UNSPECIFIED: &str = "unspecified";

/// One counted label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// One visible slice of a proportion bar, in final display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub label: String,
    pub count: usize,
    /// Sum of the widths of the visible segments before this one.
    pub start_percent: u32,
    /// `round(count / total * 100)`, rounding halves up.
    pub width_percent: u32,
}

/// Sorted label counts for one field over one event subset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    entries: Vec<LabelCount>,
    total: usize,
}

impl Distribution {
    fn from_entries(entries: Vec<LabelCount>) -> Self {
        let total = entries.iter().map(|entry| entry.count).sum();
        Self { entries, total }
    }

    #[must_use]
    pub fn entries(&self) -> &[LabelCount] {
        &self.entries
    }

    /// Entries as `(label, count)` pairs.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&str, usize)> {
        self.entries
            .iter()
            .map(|entry| (entry.label.as_str(), entry.count))
            .collect()
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rounded share of `count` in this distribution, in percent.
    #[must_use]
    pub fn percent(&self, count: usize) -> u32 {
        rounded_percent(count, self.total)
    }

    /// Visible segments with cumulative offsets.
    ///
    /// Labels whose rounded share is 0% are left out; their counts remain in
    /// [`Distribution::entries`].
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        let mut start = 0;
        let mut segments = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let width = self.percent(entry.count);
            if width == 0 {
                continue;
            }
            segments.push(Segment {
                label: entry.label.clone(),
                count: entry.count,
                start_percent: start,
                width_percent: width,
            });
            start += width;
        }
        segments
    }
}

fn rounded_percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let count = count as u128;
    let total = total as u128;
    let rounded = (count * 200 + total) / (total * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Counts per label in first-seen order, with the sentinel kept aside.
#[derive(Default)]
struct Tally {
    labels: Vec<LabelCount>,
    index: HashMap<String, usize>,
    unspecified: usize,
}

impl Tally {
    fn add(&mut self, label: Option<&str>) {
        let Some(label) = label.filter(|label| *label != UNSPECIFIED) else {
            self.unspecified += 1;
            return;
        };
        if let Some(&slot) = self.index.get(label) {
            self.labels[slot].count += 1;
        } else {
            self.index.insert(label.to_string(), self.labels.len());
            self.labels.push(LabelCount {
                label: label.to_string(),
                count: 1,
            });
        }
    }

    fn count_of(&self, label: &str) -> usize {
        self.index
            .get(label)
            .map_or(0, |&slot| self.labels[slot].count)
    }

    fn finish(self, mut ordered: Vec<LabelCount>) -> Distribution {
        if self.unspecified > 0 {
            ordered.push(LabelCount {
                label: UNSPECIFIED.to_string(),
                count: self.unspecified,
            });
        }
        Distribution::from_entries(ordered)
    }
}

/// Distribution builder carrying the field-specific rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProportionAggregator {
    numeric_fields: BTreeSet<String>,
    allow_lists: BTreeMap<String, Vec<String>>,
}

impl Default for ProportionAggregator {
    fn default() -> Self {
        Self::from(&ProportionSection::default())
    }
}

impl From<&ProportionSection> for ProportionAggregator {
    fn from(section: &ProportionSection) -> Self {
        Self {
            numeric_fields: section.numeric_fields.iter().cloned().collect(),
            allow_lists: section.allow_lists.clone(),
        }
    }
}

impl ProportionAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_numeric(&self, field_key: &str) -> bool {
        self.numeric_fields.contains(field_key)
    }

    /// Allow-list configured for `field_key`, if any.
    #[must_use]
    pub fn allow_list(&self, field_key: &str) -> Option<&[String]> {
        self.allow_lists.get(field_key).map(Vec::as_slice)
    }

    /// Count `field_key` over `events` and order the labels.
    pub fn aggregate<'e>(
        &self,
        events: impl IntoIterator<Item = &'e Event>,
        field_key: &str,
        allow_list: Option<&[String]>,
    ) -> Distribution {
        let mut tally = Tally::default();
        for event in events {
            let value = event.field(field_key);
            let label = value
                .as_deref()
                .filter(|v| allow_list.is_none_or(|allowed| allowed.iter().any(|a| a == v)));
            tally.add(label);
        }

        let ordered = match allow_list {
            Some(allowed) => Self::allow_list_order(&tally, allowed),
            None if self.is_numeric(field_key) => Self::numeric_order(&tally),
            None => Self::count_order(&tally),
        };
        let distribution = tally.finish(ordered);
        tracing::trace!(
            field = field_key,
            labels = distribution.entries.len(),
            total = distribution.total,
            "aggregated distribution"
        );
        distribution
    }

    /// [`ProportionAggregator::aggregate`] with the configured allow-list
    /// for `field_key`.
    pub fn aggregate_configured<'e>(
        &self,
        events: impl IntoIterator<Item = &'e Event>,
        field_key: &str,
    ) -> Distribution {
        self.aggregate(events, field_key, self.allow_list(field_key))
    }

    fn allow_list_order(tally: &Tally, allowed: &[String]) -> Vec<LabelCount> {
        let mut listed: BTreeSet<&str> = BTreeSet::new();
        let mut ordered: Vec<LabelCount> = allowed
            .iter()
            .filter(|label| listed.insert(label.as_str()))
            .map(|label| LabelCount {
                label: label.clone(),
                count: tally.count_of(label),
            })
            .filter(|entry| entry.count > 0)
            .collect();
        ordered.sort_by(|a, b| b.count.cmp(&a.count));
        ordered
    }

    fn numeric_order(tally: &Tally) -> Vec<LabelCount> {
        let mut ordered = tally.labels.clone();
        ordered.sort_by(|a, b| {
            match (a.label.trim().parse::<f64>(), b.label.trim().parse::<f64>()) {
                (Ok(x), Ok(y)) => x.total_cmp(&y),
                (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                (Err(_), Err(_)) => a.label.cmp(&b.label),
            }
        });
        ordered
    }

    fn count_order(tally: &Tally) -> Vec<LabelCount> {
        let mut ordered = tally.labels.clone();
        ordered.sort_by(|a, b| b.count.cmp(&a.count));
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use platelog_core::Rating;

    fn base(id: usize) -> Event {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        Event::new(format!("e{id}"), date, "lunch")
    }

    fn with_field(key: &str, values: &[Option<&str>]) -> Vec<Event> {
        values
            .iter()
            .enumerate()
            .map(|(i, value)| match value {
                Some(v) => base(i).with_field(key, *v),
                None => base(i),
            })
            .collect()
    }

    fn allow(labels: &[&str]) -> Vec<String> {
        labels.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn ratings_sort_ascending_with_sentinel_last() {
        let events: Vec<Event> = [Some(1), Some(3), Some(3), Some(5), None]
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                let mut event = base(i);
                event.rating = r.map(|r| Rating::new(r).expect("rating"));
                event
            })
            .collect();

        let dist = ProportionAggregator::new().aggregate(&events, "rating", None);
        assert_eq!(
            dist.pairs(),
            [("1", 1), ("3", 2), ("5", 1), ("unspecified", 1)]
        );
        assert_eq!(dist.total(), 5);
    }

    #[test]
    fn allow_list_coerces_unknown_values() {
        let events = with_field("category", &[Some("A"), Some("A"), Some("C")]);
        let dist =
            ProportionAggregator::new().aggregate(&events, "category", Some(&allow(&["A", "B"])));
        assert_eq!(dist.pairs(), [("A", 2), ("unspecified", 1)]);
    }

    #[test]
    fn allow_list_resorts_by_count() {
        let events = with_field(
            "category",
            &[Some("B"), Some("B"), Some("C"), Some("A"), None, Some("Z")],
        );
        let dist = ProportionAggregator::new().aggregate(
            &events,
            "category",
            Some(&allow(&["A", "B", "C"])),
        );
        assert_eq!(
            dist.pairs(),
            [("B", 2), ("A", 1), ("C", 1), ("unspecified", 2)]
        );
    }

    #[test]
    fn other_fields_sort_by_count_then_first_seen() {
        let events = with_field(
            "place",
            &[Some("cafe"), Some("home"), None, Some("home"), Some("office"), Some("")],
        );
        let dist = ProportionAggregator::new().aggregate(&events, "place", None);
        assert_eq!(
            dist.pairs(),
            [("home", 2), ("cafe", 1), ("office", 1), ("unspecified", 2)]
        );
    }

    #[test]
    fn numeric_field_puts_non_numbers_after_numbers() {
        let events = with_field("satiety", &[Some("10"), Some("full"), Some("2"), Some("2")]);
        let dist = ProportionAggregator::new().aggregate(&events, "satiety", None);
        assert_eq!(dist.pairs(), [("2", 2), ("10", 1), ("full", 1)]);
    }

    #[test]
    fn empty_input_is_empty_distribution() {
        let none: [Event; 0] = [];
        let dist = ProportionAggregator::new().aggregate(&none, "rating", None);
        assert!(dist.is_empty());
        assert_eq!(dist.total(), 0);
        assert!(dist.segments().is_empty());
    }

    #[test]
    fn segments_accumulate_and_skip_zero_width() {
        let mut values = vec![Some("main"); 250];
        values.push(Some("rare"));
        values.extend([Some("side"); 49]);
        let events = with_field("kind_of_dish", &values);

        let dist = ProportionAggregator::new().aggregate(&events, "kind_of_dish", None);
        assert_eq!(dist.pairs(), [("main", 250), ("side", 49), ("rare", 1)]);

        let segments = dist.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].label, "main");
        assert_eq!(segments[0].start_percent, 0);
        assert_eq!(segments[0].width_percent, 83);
        assert_eq!(segments[1].label, "side");
        assert_eq!(segments[1].start_percent, 83);
        assert_eq!(segments[1].width_percent, 16);
    }

    #[test]
    fn percent_rounds_half_up() {
        let mut values = vec![Some("a")];
        values.extend([Some("b"); 7]);
        let events = with_field("place", &values);
        let dist = ProportionAggregator::new().aggregate(&events, "place", None);
        // 1/8 = 12.5% rounds to 13, 7/8 = 87.5% rounds to 88.
        assert_eq!(dist.percent(1), 13);
        assert_eq!(dist.percent(7), 88);
    }

    #[test]
    fn segments_serialize_for_renderers() {
        let events = with_field("place", &[Some("home"), Some("home"), None]);
        let dist = ProportionAggregator::new().aggregate(&events, "place", None);
        let json = serde_json::to_value(dist.segments()).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!([
                {"label": "home", "count": 2, "start_percent": 0, "width_percent": 67},
                {"label": "unspecified", "count": 1, "start_percent": 67, "width_percent": 33},
            ])
        );
    }

    #[test]
    fn configured_allow_list_is_used() {
        let mut section = ProportionSection::default();
        section
            .allow_lists
            .insert("category".to_string(), allow(&["Italian"]));
        let aggregator = ProportionAggregator::from(&section);

        let events = with_field("category", &[Some("Italian"), Some("Thai")]);
        let dist = aggregator.aggregate_configured(&events, "category");
        assert_eq!(dist.pairs(), [("Italian", 1), ("unspecified", 1)]);

        let open = aggregator.aggregate_configured(&events, "place");
        assert_eq!(open.pairs(), [("unspecified", 2)]);
    }
}
