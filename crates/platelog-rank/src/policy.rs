//! Caller-side presentation filters for ranking results.
//!
//! Rankings are computed once; how many entries a view shows and which
//! ratings qualify is a presentation decision layered on afterwards, so the
//! week view (`>= 4`) and the month/year views (`== 5`) share one engine.

use serde::{Deserialize, Serialize};

use platelog_core::config::PresentationSection;
use platelog_core::{Event, PeriodKind, Rating};

/// Which ratings a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "rating", rename_all = "snake_case")]
pub enum RatingFilter {
    /// Every entry, rated or not.
    Any,
    AtLeast(Rating),
    Exactly(Rating),
}

impl RatingFilter {
    #[must_use]
    pub fn accepts(self, event: &Event) -> bool {
        match self {
            Self::Any => true,
            Self::AtLeast(min) => event.rating.is_some_and(|r| r >= min),
            Self::Exactly(want) => event.rating == Some(want),
        }
    }
}

/// Rating filter plus an optional cap on the number of entries shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationPolicy {
    pub filter: RatingFilter,
    pub top_n: Option<usize>,
}

impl PresentationPolicy {
    /// Show everything the ranking produced.
    pub const UNFILTERED: Self = Self {
        filter: RatingFilter::Any,
        top_n: None,
    };

    /// Week views show four stars and up; month and year views only fives.
    #[must_use]
    pub const fn default_for(kind: PeriodKind) -> Self {
        let filter = match kind {
            PeriodKind::Week => RatingFilter::AtLeast(Rating::saturating(4)),
            PeriodKind::Month | PeriodKind::Year => RatingFilter::Exactly(Rating::MAX),
        };
        Self {
            filter,
            top_n: None,
        }
    }

    /// Policy for `kind` as configured in the `[presentation]` section.
    ///
    /// Values are expected to have passed `EngineConfig::validate`; an
    /// out-of-range rating falls back to the built-in default for `kind`.
    #[must_use]
    pub fn from_config(kind: PeriodKind, section: &PresentationSection) -> Self {
        let fallback = Self::default_for(kind);
        let filter = match kind {
            PeriodKind::Week => Rating::new(section.week_min_rating)
                .map_or(fallback.filter, RatingFilter::AtLeast),
            PeriodKind::Month => Rating::new(section.month_exact_rating)
                .map_or(fallback.filter, RatingFilter::Exactly),
            PeriodKind::Year => Rating::new(section.year_exact_rating)
                .map_or(fallback.filter, RatingFilter::Exactly),
        };
        Self {
            filter,
            top_n: section.top_n,
        }
    }

    #[must_use]
    pub const fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    /// Filter `ranked` and truncate it, preserving order.
    #[must_use]
    pub fn apply<'a>(&self, ranked: Vec<&'a Event>) -> Vec<&'a Event> {
        let limit = self.top_n.unwrap_or(usize::MAX);
        ranked
            .into_iter()
            .filter(|event| self.filter.accepts(event))
            .take(limit)
            .collect()
    }
}
