use std::fmt;

/// Machine-readable error codes shared by every platelog error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidPeriod,
    ConfigParseError,
    InvalidRating,
    InvalidReorder,
    StoreReadFailed,
    OrderWriteFailed,
    CorruptRecord,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidPeriod => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidRating => "E1003",
            Self::InvalidReorder => "E1004",
            Self::StoreReadFailed => "E3001",
            Self::OrderWriteFailed => "E3002",
            Self::CorruptRecord => "E3003",
        }
    }

    /// Short human-facing summary for logs.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidPeriod => "Invalid period coordinates",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidRating => "Rating out of range",
            Self::InvalidReorder => "Invalid reorder request",
            Self::StoreReadFailed => "Store read failed",
            Self::OrderWriteFailed => "Saved order write failed",
            Self::CorruptRecord => "Corrupt stored record",
        }
    }

    /// Optional remediation hint for callers.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidPeriod => {
                Some("Use a month in 1..=12 and a week index within the month's week count.")
            }
            Self::ConfigParseError => Some("Fix syntax in config.toml and retry."),
            Self::InvalidRating => Some("Ratings are whole numbers from 1 to 5."),
            Self::InvalidReorder => Some("Refresh the list; the displayed order is stale."),
            Self::StoreReadFailed => None,
            Self::OrderWriteFailed => {
                Some("Retry the reorder; the displayed order was not saved.")
            }
            Self::CorruptRecord => Some("Re-save the affected entry to rewrite the record."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
