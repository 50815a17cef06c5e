// Calendar parsing at the input boundary.
// Everything inside the engine is NaiveDate / MonthKey; text only appears here.

use crate::error::{LedgerError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const ISO_DATE: &str = "%Y-%m-%d";
pub const DAY_FIRST_DATE: &str = "%d-%m-%Y";

/// Split `a-b[-c]` into digit-only segments, rejecting anything else.
fn digit_segments(input: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = input.split('-').collect();
    if parts
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    {
        Some(parts)
    } else {
        None
    }
}

/// Parse an entry date. Accepts `YYYY-MM-DD` and `DD-MM-YYYY`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    let invalid = || {
        LedgerError::validation(format!(
            "invalid date `{}`: use YYYY-MM-DD or DD-MM-YYYY",
            input
        ))
    };

    let parts = digit_segments(input).ok_or_else(invalid)?;
    let format = match parts.iter().map(|p| p.len()).collect::<Vec<_>>().as_slice() {
        [4, 2, 2] => ISO_DATE,
        [2, 2, 4] => DAY_FIRST_DATE,
        _ => return Err(invalid()),
    };

    NaiveDate::parse_from_str(input, format).map_err(|_| invalid())
}

/// Canonical text form of a stored date.
pub fn format_date(date: NaiveDate) -> String {
    date.format(ISO_DATE).to_string()
}

/// A calendar month, used as the bucket key for monthly rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::validation(format!(
                "invalid month {}: must be between 1 and 12",
                month
            )));
        }
        Ok(MonthKey { year, month })
    }

    /// Month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a month token: `YYYY-MM` or `MM-YYYY`, exact digit counts.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let invalid = || {
            LedgerError::validation(format!(
                "invalid month `{}`: use YYYY-MM or MM-YYYY",
                token
            ))
        };

        let parts = digit_segments(token).ok_or_else(invalid)?;
        let (year, month) = match parts.as_slice() {
            [y, m] if y.len() == 4 && m.len() == 2 => (*y, *m),
            [m, y] if m.len() == 2 && y.len() == 4 => (*y, *m),
            _ => return Err(invalid()),
        };

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        MonthKey::parse(s)
    }
}

// Serialised as "YYYY-MM" so month-keyed maps become plain JSON objects.
impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MonthKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_both_formats() {
        assert_eq!(parse_date("2024-06-01").unwrap(), ymd(2024, 6, 1));
        assert_eq!(parse_date("01-06-2024").unwrap(), ymd(2024, 6, 1));
        assert_eq!(parse_date("  2024-12-31 ").unwrap(), ymd(2024, 12, 31));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        for bad in ["", "2024/06/01", "2024-6-1", "31-02-2024", "2024-13-01", "24-06-01", "yesterday"] {
            let err = parse_date(bad).unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_format_date_is_iso() {
        assert_eq!(format_date(ymd(2024, 3, 9)), "2024-03-09");
    }

    #[test]
    fn test_month_key_parse() {
        let key = MonthKey::parse("2024-06").unwrap();
        assert_eq!((key.year(), key.month()), (2024, 6));
        assert_eq!(MonthKey::parse("06-2024").unwrap(), key);
        assert_eq!(key.to_string(), "2024-06");
    }

    #[test]
    fn test_month_key_rejects_out_of_range_and_bad_digits() {
        for bad in ["13-2024", "2024-13", "2024-00", "2024-6", "202-06", "2024", "", "2024-06-01", "ab-2024"] {
            assert!(
                matches!(MonthKey::parse(bad), Err(LedgerError::Validation(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_month_key_contains_and_orders() {
        let may = MonthKey::parse("2024-05").unwrap();
        let june = MonthKey::of(ymd(2024, 6, 15));
        assert!(june.contains(ymd(2024, 6, 1)));
        assert!(june.contains(ymd(2024, 6, 30)));
        assert!(!june.contains(ymd(2023, 6, 1)));
        assert!(may < june);
    }

    #[test]
    fn test_month_key_serde_as_string() {
        let key = MonthKey::parse("2024-06").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2024-06\"");
        let back: MonthKey = serde_json::from_str("\"06-2024\"").unwrap();
        assert_eq!(back, key);
    }
}
