use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::error::GdeltError;
use crate::schema::{DatasetSchema, EVENTS, GKG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Events,
    Gkg,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Events, DatasetKind::Gkg];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Events => "events",
            DatasetKind::Gkg => "gkg",
        }
    }

    pub fn schema(&self) -> &'static DatasetSchema {
        match self {
            DatasetKind::Events => &EVENTS,
            DatasetKind::Gkg => &GKG,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar day in `YYYY-MM-DD` form, validated on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetDate(NaiveDate);

impl TargetDate {
    /// First day after this one; the exclusive end of the fetch window.
    pub fn next_day(&self) -> Result<TargetDate, GdeltError> {
        self.0
            .checked_add_days(Days::new(1))
            .map(TargetDate)
            .ok_or_else(|| GdeltError::InvalidDate(self.to_string()))
    }

    /// `YYYYMMDD`, used for file names and integer date comparisons.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    pub fn compact_number(&self) -> u32 {
        self.0.year() as u32 * 10_000 + self.0.month() * 100 + self.0.day()
    }
}

impl fmt::Display for TargetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for TargetDate {
    type Err = GdeltError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let is_shaped = value.len() == 10
            && value.char_indices().all(|(idx, ch)| match idx {
                4 | 7 => ch == '-',
                _ => ch.is_ascii_digit(),
            });
        if !is_shaped {
            return Err(GdeltError::InvalidDate(value.to_string()));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| GdeltError::InvalidDate(value.to_string()))
    }
}

/// Upper bound on rows pulled for one dataset and day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxRecords(u64);

impl MaxRecords {
    pub const DEFAULT: MaxRecords = MaxRecords(100_000);

    pub fn new(value: u64) -> Result<Self, GdeltError> {
        if value == 0 {
            return Err(GdeltError::InvalidMaxRecords(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for MaxRecords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_target_date_valid() {
        let date: TargetDate = "2025-01-06".parse().unwrap();
        assert_eq!(date.compact(), "20250106");
        assert_eq!(date.compact_number(), 20250106);
        assert_eq!(date.to_string(), "2025-01-06");
    }

    #[test]
    fn parse_target_date_rejects_loose_forms() {
        for input in [
            "2025-1-6",
            "20250106",
            "2025/01/06",
            "2025-01-06T00:00",
            "2025-13-40",
            "2025-02-30",
            " 2025-01-06",
            "2025-01-06\n",
        ] {
            let err = input.parse::<TargetDate>().unwrap_err();
            assert_matches!(err, GdeltError::InvalidDate(_));
        }
    }

    #[test]
    fn next_day_crosses_year_boundary() {
        let date: TargetDate = "2024-12-31".parse().unwrap();
        assert_eq!(date.next_day().unwrap().to_string(), "2025-01-01");
    }

    #[test]
    fn max_records_must_be_positive() {
        assert_matches!(MaxRecords::new(0), Err(GdeltError::InvalidMaxRecords(0)));
        assert_eq!(MaxRecords::new(5).unwrap().get(), 5);
    }
}
