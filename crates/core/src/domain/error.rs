use chrono::NaiveDate;
use std::fmt;

/// Malformed user input. Aborts the triggering update and leaves the display untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    MissingHorizon,
    InvalidHorizon { raw: String },
    DateBeforeEarliest {
        field: &'static str,
        date: NaiveDate,
        earliest: NaiveDate,
    },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHorizon => write!(f, "number of days is required for a forecast"),
            Self::InvalidHorizon { raw } => {
                write!(f, "number of days must be a non-negative integer (got {raw:?})")
            }
            Self::DateBeforeEarliest {
                field,
                date,
                earliest,
            } => write!(f, "{field} {date} is before the earliest allowed date {earliest}"),
        }
    }
}

impl std::error::Error for InputError {}
