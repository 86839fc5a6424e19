//! Sunday-anchored calendar partitioning.
//!
//! A month is split into week buckets that run Sunday through Saturday. Week 1
//! starts on the first Sunday on or before the 1st of the month, so its first
//! days may belong to the previous month; the last bucket may likewise spill
//! into the next month. Every function here is pure date math over
//! [`chrono::NaiveDate`] and validates its coordinates instead of clamping
//! them.

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ErrorCode;
use crate::model::DATE_FORMAT;

const DAYS_PER_WEEK: u32 = 7;

/// Invalid period coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("year {0} is outside the supported calendar range")]
    InvalidYear(i32),

    #[error("week {index} is outside 1..={count} for {year}-{month:02}")]
    InvalidWeek {
        year: i32,
        month: u32,
        index: u32,
        count: u32,
    },
}

impl PeriodError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidPeriod
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every day of the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|day| *day <= self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..={}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Reject months outside `1..=12`.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidMonth`] for an out-of-range month.
pub const fn check_month(month: u32) -> Result<(), PeriodError> {
    if month >= 1 && month <= 12 {
        Ok(())
    } else {
        Err(PeriodError::InvalidMonth(month))
    }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, PeriodError> {
    check_month(month)?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(PeriodError::InvalidYear(year))
}

/// First and last day of a month.
///
/// # Errors
///
/// Returns [`PeriodError`] when the month or year is invalid.
pub fn month_range(year: i32, month: u32) -> Result<DateRange, PeriodError> {
    let start = first_of_month(year, month)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next
        .and_then(|day| day.pred_opt())
        .ok_or(PeriodError::InvalidYear(year))?;
    Ok(DateRange { start, end })
}

/// January 1st through December 31st.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidYear`] when chrono cannot represent the year.
pub fn year_range(year: i32) -> Result<DateRange, PeriodError> {
    let start = first_of_month(year, 1)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(PeriodError::InvalidYear(year))?;
    Ok(DateRange { start, end })
}

fn days_in_month(year: i32, month: u32) -> Result<u32, PeriodError> {
    month_range(year, month).map(|range| range.end.day())
}

/// Start of week 1: the Sunday on or before the 1st of the month.
fn first_week_start(year: i32, month: u32) -> Result<NaiveDate, PeriodError> {
    let first = first_of_month(year, month)?;
    let offset = u64::from(first.weekday().num_days_from_sunday());
    first
        .checked_sub_days(Days::new(offset))
        .ok_or(PeriodError::InvalidYear(year))
}

/// Number of week buckets for a month.
///
/// A leading partial bucket counts when the month does not start on a
/// Sunday. The trailing bucket counts when days remain after the full weeks,
/// and also when the month's last day is a Saturday.
///
/// # Errors
///
/// Returns [`PeriodError`] when the month or year is invalid.
pub fn week_count(year: i32, month: u32) -> Result<u32, PeriodError> {
    let first = first_of_month(year, month)?;
    let days = days_in_month(year, month)?;
    let first_dow = first.weekday().num_days_from_sunday();
    let last_is_saturday = month_range(year, month)?.end.weekday() == Weekday::Sat;

    let lead = (DAYS_PER_WEEK - first_dow) % DAYS_PER_WEEK;
    let mut count = u32::from(lead > 0);
    let remaining = days - lead;
    count += remaining / DAYS_PER_WEEK;
    if remaining % DAYS_PER_WEEK > 0 || last_is_saturday {
        count += 1;
    }
    Ok(count)
}

/// Sunday-to-Saturday range of week `week_index` (1-based) of a month.
///
/// # Errors
///
/// Returns [`PeriodError`] when the month or year is invalid or when
/// `week_index` is outside `1..=week_count(year, month)`.
pub fn week_range(year: i32, month: u32, week_index: u32) -> Result<DateRange, PeriodError> {
    let count = week_count(year, month)?;
    if week_index == 0 || week_index > count {
        return Err(PeriodError::InvalidWeek {
            year,
            month,
            index: week_index,
            count,
        });
    }

    let offset = u64::from((week_index - 1) * DAYS_PER_WEEK);
    let start = first_week_start(year, month)?
        .checked_add_days(Days::new(offset))
        .ok_or(PeriodError::InvalidYear(year))?;
    let end = start
        .checked_add_days(Days::new(u64::from(DAYS_PER_WEEK - 1)))
        .ok_or(PeriodError::InvalidYear(year))?;
    Ok(DateRange { start, end })
}

/// 1-based index of the week of (`year`, `month`) that contains `today`.
///
/// Falls back to `1` when `today` is not a day of that month.
///
/// # Errors
///
/// Returns [`PeriodError`] when the month or year is invalid.
pub fn current_week_index(year: i32, month: u32, today: NaiveDate) -> Result<u32, PeriodError> {
    if !month_range(year, month)?.contains(today) {
        return Ok(1);
    }

    let start = first_week_start(year, month)?;
    let elapsed = (today - start).num_days();
    let index = u32::try_from(elapsed / i64::from(DAYS_PER_WEEK)).unwrap_or(0) + 1;
    Ok(index)
}

/// [`current_week_index`] evaluated against the local clock.
///
/// # Errors
///
/// Returns [`PeriodError`] when the month or year is invalid.
pub fn current_week_index_now(year: i32, month: u32) -> Result<u32, PeriodError> {
    current_week_index(year, month, Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn february_2024_has_five_weeks_starting_january_28() {
        assert_eq!(week_count(2024, 2), Ok(5));
        let first = week_range(2024, 2, 1).expect("week 1");
        assert_eq!(first.start, day(2024, 1, 28));
        assert_eq!(first.end, day(2024, 2, 3));
        let last = week_range(2024, 2, 5).expect("week 5");
        assert_eq!(last.start, day(2024, 2, 25));
        assert_eq!(last.end, day(2024, 3, 2));
    }

    #[test]
    fn month_starting_on_sunday_has_no_leading_bucket() {
        // September 2024 starts on a Sunday and ends on a Monday.
        assert_eq!(week_count(2024, 9), Ok(5));
        let first = week_range(2024, 9, 1).expect("week 1");
        assert_eq!(first.start, day(2024, 9, 1));
    }

    #[test]
    fn month_ending_on_saturday_counts_trailing_bucket() {
        // February 2026: Sunday the 1st through Saturday the 28th.
        assert_eq!(week_count(2026, 2), Ok(5));
        let trailing = week_range(2026, 2, 5).expect("week 5");
        assert_eq!(trailing.start, day(2026, 3, 1));

        // August 2026 ends on Monday the 31st; November 2025 ends on Sunday.
        assert_eq!(week_count(2026, 8), Ok(6));
        assert_eq!(week_count(2025, 11), Ok(6));
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        assert_eq!(week_count(2024, 13), Err(PeriodError::InvalidMonth(13)));
        assert_eq!(week_count(2024, 0), Err(PeriodError::InvalidMonth(0)));
        assert_eq!(
            week_range(2024, 2, 6),
            Err(PeriodError::InvalidWeek {
                year: 2024,
                month: 2,
                index: 6,
                count: 5,
            })
        );
        assert!(matches!(
            week_range(2024, 2, 0),
            Err(PeriodError::InvalidWeek { index: 0, .. })
        ));
        assert_eq!(
            PeriodError::InvalidMonth(13).code(),
            ErrorCode::InvalidPeriod
        );
    }

    #[test]
    fn month_and_year_ranges_are_inclusive() {
        let feb = month_range(2024, 2).expect("feb");
        assert_eq!(feb.end, day(2024, 2, 29));
        assert_eq!(feb.days().count(), 29);
        let dec = month_range(2023, 12).expect("dec");
        assert_eq!(dec.end, day(2023, 12, 31));
        let year = year_range(2024).expect("year");
        assert_eq!(year.days().count(), 366);
        assert_eq!(year.to_string(), "2024-01-01..=2024-12-31");
    }

    #[test]
    fn current_week_index_finds_containing_week() {
        assert_eq!(current_week_index(2024, 2, day(2024, 2, 1)), Ok(1));
        assert_eq!(current_week_index(2024, 2, day(2024, 2, 4)), Ok(2));
        assert_eq!(current_week_index(2024, 2, day(2024, 2, 29)), Ok(5));
    }

    #[test]
    fn current_week_index_outside_month_falls_back_to_one() {
        assert_eq!(current_week_index(2024, 2, day(2024, 3, 20)), Ok(1));
        // Jan 28 lies in week 1's range but is not a day of February.
        assert_eq!(current_week_index(2024, 2, day(2024, 1, 28)), Ok(1));
    }

    #[test]
    fn current_week_index_now_tracks_the_local_clock() {
        let today = Local::now().date_naive();
        let index = current_week_index_now(today.year(), today.month()).expect("current month");
        assert!(week_range(today.year(), today.month(), index)
            .expect("week")
            .contains(today));

        assert_eq!(current_week_index_now(1999, 1), Ok(1));
        assert_eq!(current_week_index_now(2024, 13), Err(PeriodError::InvalidMonth(13)));
    }
}
