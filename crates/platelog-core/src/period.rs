//! Period coordinates and their stable string keys.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::calendar::{self, DateRange, PeriodError};

/// The three nested period granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Week,
    Month,
    Year,
}

impl PeriodKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`PeriodKind`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid period kind: '{0}'")]
pub struct ParsePeriodKindError(pub String);

impl FromStr for PeriodKind {
    type Err = ParsePeriodKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(ParsePeriodKindError(s.to_string())),
        }
    }
}

/// Validated period coordinates.
///
/// Construct through [`Period::week`], [`Period::month`], or [`Period::year`];
/// the constructors reject coordinates the calendar cannot resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Period {
    Week { year: i32, month: u32, index: u32 },
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

impl Period {
    /// # Errors
    ///
    /// Returns [`PeriodError`] when the week does not exist in that month.
    pub fn week(year: i32, month: u32, index: u32) -> Result<Self, PeriodError> {
        calendar::week_range(year, month, index)?;
        Ok(Self::Week { year, month, index })
    }

    /// # Errors
    ///
    /// Returns [`PeriodError`] for a month outside `1..=12`.
    pub fn month(year: i32, month: u32) -> Result<Self, PeriodError> {
        calendar::month_range(year, month)?;
        Ok(Self::Month { year, month })
    }

    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidYear`] for a year chrono cannot represent.
    pub fn year(year: i32) -> Result<Self, PeriodError> {
        calendar::year_range(year)?;
        Ok(Self::Year { year })
    }

    #[must_use]
    pub const fn kind(&self) -> PeriodKind {
        match self {
            Self::Week { .. } => PeriodKind::Week,
            Self::Month { .. } => PeriodKind::Month,
            Self::Year { .. } => PeriodKind::Year,
        }
    }

    #[must_use]
    pub fn key(&self) -> PeriodKey {
        PeriodKey::for_period(self)
    }

    /// Inclusive date range covered by the period.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError`] when the coordinates were built by hand and do
    /// not resolve.
    pub fn range(&self) -> Result<DateRange, PeriodError> {
        match *self {
            Self::Week { year, month, index } => calendar::week_range(year, month, index),
            Self::Month { year, month } => calendar::month_range(year, month),
            Self::Year { year } => calendar::year_range(year),
        }
    }

    /// Periods one level down, in calendar order. Weeks have none.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError`] when the coordinates do not resolve.
    pub fn children(&self) -> Result<Vec<Self>, PeriodError> {
        match *self {
            Self::Week { .. } => Ok(Vec::new()),
            Self::Month { year, month } => {
                let count = calendar::week_count(year, month)?;
                Ok((1..=count)
                    .map(|index| Self::Week { year, month, index })
                    .collect())
            }
            Self::Year { year } => {
                calendar::year_range(year)?;
                Ok((1..=12).map(|month| Self::Month { year, month }).collect())
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Week { year, month, index } => write!(f, "{year}-{month:02} week {index}"),
            Self::Month { year, month } => write!(f, "{year}-{month:02}"),
            Self::Year { year } => write!(f, "{year}"),
        }
    }
}

/// Stable string identifying a period, used to key saved manual orders.
///
/// - week: `week_{year}_{month}_{weekIndex}`
/// - month: `month_{year}-{MM}`
/// - year: `year_{year}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    #[must_use]
    pub fn for_period(period: &Period) -> Self {
        let key = match *period {
            Period::Week { year, month, index } => format!("week_{year}_{month}_{index}"),
            Period::Month { year, month } => format!("month_{year}-{month:02}"),
            Period::Year { year } => format!("year_{year}"),
        };
        Self(key)
    }

    /// Wrap a key read back from storage without re-validating it.
    #[must_use]
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_documented_formats() {
        let week = Period::week(2024, 3, 2).expect("week");
        assert_eq!(week.key().as_str(), "week_2024_3_2");

        let month = Period::month(2024, 3).expect("month");
        assert_eq!(month.key().as_str(), "month_2024-03");

        let december = Period::month(2023, 12).expect("month");
        assert_eq!(december.key().as_str(), "month_2023-12");

        let year = Period::year(2024).expect("year");
        assert_eq!(year.key().as_str(), "year_2024");
    }

    #[test]
    fn identical_coordinates_give_identical_keys() {
        let a = Period::week(2025, 11, 6).expect("week");
        let b = Period::week(2025, 11, 6).expect("week");
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Period::week(2025, 11, 5).expect("week").key());
    }

    #[test]
    fn constructors_validate_coordinates() {
        assert_eq!(Period::month(2024, 13), Err(PeriodError::InvalidMonth(13)));
        assert!(Period::week(2024, 2, 6).is_err());
        assert!(Period::year(i32::MAX).is_err());
    }

    #[test]
    fn children_walk_one_level_down() {
        let feb = Period::month(2024, 2).expect("month");
        let weeks = feb.children().expect("weeks");
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0].key().as_str(), "week_2024_2_1");
        assert_eq!(weeks[4].key().as_str(), "week_2024_2_5");

        let months = Period::year(2024).expect("year").children().expect("months");
        assert_eq!(months.len(), 12);
        assert!(months.iter().all(|m| m.kind() == PeriodKind::Month));

        let week = Period::week(2024, 2, 1).expect("week");
        assert!(week.children().expect("no children").is_empty());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Month".parse::<PeriodKind>(), Ok(PeriodKind::Month));
        assert!("fortnight".parse::<PeriodKind>().is_err());
        assert_eq!(PeriodKind::Year.to_string(), "year");
    }
}
