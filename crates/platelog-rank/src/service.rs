//! Store-backed entry points for the ranking views.
//!
//! [`RankingService`] reads one event snapshot and the saved orders a period
//! needs, then runs the pure engine over them.

use tracing::instrument;

use platelog_core::calendar::PeriodError;
use platelog_core::config::{EngineConfig, OrderReadMode};
use platelog_core::error::ErrorCode;
use platelog_core::{
    DateRange, Event, EventId, EventSource, OrderStore, Period, PeriodKey, SavedOrders,
    StoreError,
};

use crate::order::{PersistenceError, persist_order};
use crate::policy::PresentationPolicy;
use crate::proportion::{Distribution, ProportionAggregator};
use crate::ranking::{RankingConfig, RankingEngine};

/// Failure of a store-backed ranking or distribution request.
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error("failed to read events for {range}: {source}")]
    EventRead {
        range: DateRange,
        #[source]
        source: StoreError,
    },

    /// Only raised under [`OrderReadMode::Strict`].
    #[error("failed to read saved order {key}: {source}")]
    OrderRead {
        key: PeriodKey,
        #[source]
        source: StoreError,
    },
}

impl RankingError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Period(err) => err.code(),
            Self::EventRead { source, .. } | Self::OrderRead { source, .. } => source.code(),
        }
    }
}

/// Ranking views over an event source and an order store.
#[derive(Debug)]
pub struct RankingService<S, O> {
    events: S,
    orders: O,
    ranking: RankingConfig,
    read_mode: OrderReadMode,
    proportion: ProportionAggregator,
}

impl<S: EventSource, O: OrderStore> RankingService<S, O> {
    /// Service with default thresholds and lenient order reads.
    pub fn new(events: S, orders: O) -> Self {
        Self {
            events,
            orders,
            ranking: RankingConfig::default(),
            read_mode: OrderReadMode::default(),
            proportion: ProportionAggregator::default(),
        }
    }

    pub fn from_config(events: S, orders: O, config: &EngineConfig) -> Self {
        Self {
            events,
            orders,
            ranking: RankingConfig::from(&config.ranking),
            read_mode: config.orders.read_mode,
            proportion: ProportionAggregator::from(&config.proportion),
        }
    }

    #[must_use]
    pub fn with_read_mode(mut self, read_mode: OrderReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    #[must_use]
    pub fn with_ranking(mut self, ranking: RankingConfig) -> Self {
        self.ranking = ranking;
        self
    }

    pub const fn event_source(&self) -> &S {
        &self.events
    }

    pub const fn order_store(&self) -> &O {
        &self.orders
    }

    /// Ranked entries of `period` in display order, filtered by `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError`] for invalid coordinates, a failed event read,
    /// or a failed saved-order read in strict mode.
    #[instrument(skip(self, period, policy), fields(period = %period))]
    pub fn best(
        &self,
        period: &Period,
        policy: PresentationPolicy,
    ) -> Result<Vec<Event>, RankingError> {
        let events = self.snapshot(period)?;
        let orders = self.saved_orders(period)?;
        let engine = RankingEngine::with_config(&events, &orders, self.ranking);

        let ranked = engine.ranked(period)?;
        let candidates = ranked.len();
        let shown: Vec<Event> = policy.apply(ranked).into_iter().cloned().collect();
        tracing::debug!(
            snapshot = events.len(),
            candidates,
            shown = shown.len(),
            "ranked period"
        );
        Ok(shown)
    }

    /// Save `ordered_ids` as the manual order of `period`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the order store rejects the write.
    #[instrument(skip(self, period, ordered_ids), fields(period = %period, len = ordered_ids.len()))]
    pub fn reorder(
        &self,
        period: &Period,
        ordered_ids: &[EventId],
    ) -> Result<(), PersistenceError> {
        persist_order(&self.orders, &period.key(), ordered_ids)
    }

    /// Distribution of `field_key` over the entries dated inside `period`,
    /// using the configured allow-list for that field.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError`] for invalid coordinates or a failed event read.
    #[instrument(skip(self, period), fields(period = %period))]
    pub fn distribution(
        &self,
        period: &Period,
        field_key: &str,
    ) -> Result<Distribution, RankingError> {
        let events = self.snapshot(period)?;
        Ok(self.proportion.aggregate_configured(&events, field_key))
    }

    fn snapshot(&self, period: &Period) -> Result<Vec<Event>, RankingError> {
        let range = period.range()?;
        self.events
            .events_in_range(&range)
            .map_err(|source| RankingError::EventRead { range, source })
    }

    /// Saved orders for `period` and every period nested inside it.
    fn saved_orders(&self, period: &Period) -> Result<SavedOrders, RankingError> {
        let mut orders = SavedOrders::new();
        for key in order_keys(period)? {
            match self.orders.get_order(&key) {
                Ok(ids) if ids.is_empty() => {}
                Ok(ids) => orders.insert(key, ids),
                Err(source) => match self.read_mode {
                    OrderReadMode::Strict => return Err(RankingError::OrderRead { key, source }),
                    OrderReadMode::Lenient => {
                        let code = source.code();
                        tracing::warn!(
                            key = %key,
                            code = %code,
                            "{}, using natural order: {source}",
                            code.message()
                        );
                    }
                },
            }
        }
        Ok(orders)
    }
}

fn order_keys(period: &Period) -> Result<Vec<PeriodKey>, PeriodError> {
    let mut keys = Vec::new();
    let mut pending = vec![*period];
    while let Some(next) = pending.pop() {
        keys.push(next.key());
        pending.extend(next.children()?);
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_keys_cover_months_and_weeks() {
        let keys = order_keys(&Period::year(2024).expect("year")).expect("keys");
        let months = keys
            .iter()
            .filter(|k| k.as_str().starts_with("month_"))
            .count();
        let weeks = keys
            .iter()
            .filter(|k| k.as_str().starts_with("week_"))
            .count();
        assert_eq!(keys[0].as_str(), "year_2024");
        assert_eq!(months, 12);
        assert!(weeks >= 12 * 5);
    }

    #[test]
    fn week_keys_are_just_the_week() {
        let week = Period::week(2024, 2, 3).expect("week");
        let keys = order_keys(&week).expect("keys");
        assert_eq!(keys, vec![week.key()]);
    }

    #[test]
    fn error_codes_follow_cause() {
        let err = RankingError::from(PeriodError::InvalidMonth(13));
        assert_eq!(err.code(), ErrorCode::InvalidPeriod);

        let err = RankingError::OrderRead {
            key: PeriodKey::from_raw("year_2024"),
            source: StoreError::read("offline"),
        };
        assert_eq!(err.code(), ErrorCode::StoreReadFailed);
        assert!(err.to_string().contains("year_2024"));
    }
}
