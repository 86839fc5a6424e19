//! Best-of rankings for weeks, months, and years.
//!
//! # Algorithm
//!
//! - **Week**: entries dated inside the week's Sunday-to-Saturday range with
//!   `rating >= threshold`, ordered by rating then date, both descending.
//! - **Month**: for each week bucket of the month, take the week ranking and
//!   merge it with that week's saved order. Drop entries dated outside the
//!   month, then concatenate the weeks in calendar order, keeping only the
//!   first entry seen for each [`DedupKey`].
//! - **Year**: the same composition one level up, over the twelve months and
//!   their saved orders.
//!
//! [`RankingEngine::ranked`] merges any of these with the period's own saved
//! order, which is the order a caller displays.
//!
//! Every function is a pure computation over the borrowed event snapshot and
//! saved-order snapshot; nothing is cached between calls.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use platelog_core::calendar::{self, PeriodError};
use platelog_core::config::RankingSection;
use platelog_core::{DedupKey, Event, Period, SavedOrders};

use crate::order::{merge_order, natural_cmp};

/// Tuning for the natural rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Minimum rating for a week entry to feed month and year rollups.
    pub week_threshold: u8,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { week_threshold: 4 }
    }
}

impl From<&RankingSection> for RankingConfig {
    fn from(section: &RankingSection) -> Self {
        Self {
            week_threshold: section.week_threshold,
        }
    }
}

/// Ranking evaluator bound to one event snapshot and one saved-order snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RankingEngine<'a> {
    events: &'a [Event],
    orders: &'a SavedOrders,
    config: RankingConfig,
}

impl<'a> RankingEngine<'a> {
    #[must_use]
    pub fn new(events: &'a [Event], orders: &'a SavedOrders) -> Self {
        Self::with_config(events, orders, RankingConfig::default())
    }

    #[must_use]
    pub const fn with_config(
        events: &'a [Event],
        orders: &'a SavedOrders,
        config: RankingConfig,
    ) -> Self {
        Self {
            events,
            orders,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> RankingConfig {
        self.config
    }

    /// Week entries rated at least `threshold`, best first. No cap applied.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError`] for invalid week coordinates.
    pub fn weekly_best(
        &self,
        year: i32,
        month: u32,
        week_index: u32,
        threshold: u8,
    ) -> Result<Vec<&'a Event>, PeriodError> {
        let range = calendar::week_range(year, month, week_index)?;
        let mut best: Vec<&'a Event> = self
            .events
            .iter()
            .filter(|event| range.contains(event.date))
            .filter(|event| event.rating.is_some_and(|r| r.get() >= threshold))
            .collect();
        best.sort_by(|a, b| natural_cmp(a, b));
        Ok(best)
    }

    /// Month rollup of the week rankings, each merged with its saved order.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError`] for a month outside `1..=12`.
    pub fn monthly_best(&self, year: i32, month: u32) -> Result<Vec<&'a Event>, PeriodError> {
        let month_range = calendar::month_range(year, month)?;
        let weeks = Period::month(year, month)?.children()?;

        let mut rollup = Rollup::default();
        for week in weeks {
            let Period::Week { index, .. } = week else {
                continue;
            };
            let natural = self.weekly_best(year, month, index, self.config.week_threshold)?;
            let merged = merge_order(natural, self.orders.get(&week.key()));
            rollup.extend(
                merged
                    .into_iter()
                    .filter(|event| month_range.contains(event.date)),
            );
        }

        let best = rollup.finish();
        tracing::trace!(year, month, len = best.len(), "computed monthly best");
        Ok(best)
    }

    /// Year rollup of the month rankings, each merged with its saved order.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError`] for a year the calendar cannot represent.
    pub fn yearly_best(&self, year: i32) -> Result<Vec<&'a Event>, PeriodError> {
        let months = Period::year(year)?.children()?;

        let mut rollup = Rollup::default();
        for month_period in months {
            let Period::Month { month, .. } = month_period else {
                continue;
            };
            let natural = self.monthly_best(year, month)?;
            rollup.extend(merge_order(natural, self.orders.get(&month_period.key())));
        }

        let best = rollup.finish();
        tracing::trace!(year, len = best.len(), "computed yearly best");
        Ok(best)
    }

    /// Natural ranking of any period, before its own saved order applies.
    ///
    /// Weeks use the configured `week_threshold`.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError`] when the period does not resolve.
    pub fn natural(&self, period: &Period) -> Result<Vec<&'a Event>, PeriodError> {
        match *period {
            Period::Week { year, month, index } => {
                self.weekly_best(year, month, index, self.config.week_threshold)
            }
            Period::Month { year, month } => self.monthly_best(year, month),
            Period::Year { year } => self.yearly_best(year),
        }
    }

    /// Display order of a period: its natural ranking merged with the
    /// period's own saved order.
    ///
    /// Entries the period's order does not pin are re-sorted by rating and
    /// date, so for a month or a year the saved orders one level down (weeks
    /// in a month, months in a year) only decide which entry survives a
    /// repeated [`DedupKey`], not where entries sit.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError`] when the period does not resolve.
    pub fn ranked(&self, period: &Period) -> Result<Vec<&'a Event>, PeriodError> {
        let natural = self.natural(period)?;
        Ok(merge_order(natural, self.orders.get(&period.key())))
    }
}

/// Concatenation that keeps the first entry seen for each dedup key.
#[derive(Default)]
struct Rollup<'a> {
    seen: HashSet<DedupKey>,
    entries: Vec<&'a Event>,
}

impl<'a> Rollup<'a> {
    fn extend(&mut self, events: impl IntoIterator<Item = &'a Event>) {
        for event in events {
            if self.seen.insert(event.dedup_key()) {
                self.entries.push(event);
            }
        }
    }

    fn finish(self) -> Vec<&'a Event> {
        self.entries
    }
}
