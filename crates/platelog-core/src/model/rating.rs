use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ErrorCode;

/// A 1 to 5 star rating attached to a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(5);

    /// Build a rating, rejecting values outside `1..=5`.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError`] when `value` is out of range.
    pub fn new(value: u8) -> Result<Self, RatingError> {
        if value >= Self::MIN.0 && value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(RatingError {
                got: i64::from(value),
            })
        }
    }

    /// Build a rating in const context, clamping `value` into `1..=5`.
    #[must_use]
    pub const fn saturating(value: u8) -> Self {
        if value < Self::MIN.0 {
            Self::MIN
        } else if value > Self::MAX.0 {
            Self::MAX
        } else {
            Self(value)
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// A rating value outside `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between 1 and 5, got {got}")]
pub struct RatingError {
    pub got: i64,
}

impl RatingError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidRating
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| RatingError { got: value })
            .and_then(Self::new)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rating {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s.trim().parse().map_err(|_| RatingError { got: 0 })?;
        Self::try_from(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_through_five() {
        for value in 1..=5 {
            assert_eq!(Rating::new(value).map(Rating::get), Ok(value));
        }
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(Rating::new(0), Err(RatingError { got: 0 }));
        assert_eq!(Rating::new(6), Err(RatingError { got: 6 }));
        assert!(Rating::try_from(-3_i64).is_err());
        assert!(Rating::try_from(300_i64).is_err());
    }

    #[test]
    fn saturating_clamps_into_range() {
        assert_eq!(Rating::saturating(0), Rating::MIN);
        assert_eq!(Rating::saturating(4).get(), 4);
        assert_eq!(Rating::saturating(200), Rating::MAX);
    }

    #[test]
    fn parses_trimmed_text() {
        assert_eq!(" 4 ".parse::<Rating>().map(Rating::get), Ok(4));
        assert!("four".parse::<Rating>().is_err());
    }

    #[test]
    fn serde_rejects_out_of_range() {
        let ok: Rating = serde_json::from_str("3").expect("3 is a valid rating");
        assert_eq!(ok.get(), 3);
        assert!(serde_json::from_str::<Rating>("9").is_err());
        assert_eq!(serde_json::to_string(&ok).expect("serialize"), "3");
    }
}
