//! Calendar helpers shared by every aggregator: year-month keys, inclusive
//! date ranges, and lenient parsing of the ISO strings the backend delivers.
//!
//! Month keys are the `YYYY-MM` prefix of an ISO date. [`MonthKey`] orders by
//! `(year, month)`, which is exactly the lexicographic order of the
//! zero-padded string, and it serializes back to that string. Code that
//! compares or sorts keys may rely on either form.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{InsightsError, InsightsResult};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parse the calendar date at the start of an ISO date or timestamp string.
/// Returns `None` for empty or malformed input.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let day = value.trim().get(0..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Parse a timestamp. Accepts RFC 3339, naive `T`/space separated
/// date-times with optional fractional seconds, and bare dates (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }
    if value.len() == 10 {
        return parse_day(value).and_then(|d| d.and_hms_opt(0, 0, 0));
    }
    None
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

// ─── MonthKey ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Key from the `YYYY-MM` prefix of a date string, the equivalent of
    /// `substring(0, 7)`. Malformed prefixes yield `None`.
    pub fn from_date_str(value: &str) -> Option<Self> {
        let prefix = value.trim().get(0..7)?;
        let bytes = prefix.as_bytes();
        if bytes[4] != b'-' || !bytes[..4].iter().chain(&bytes[5..]).all(u8::is_ascii_digit) {
            return None;
        }
        let year = prefix[..4].parse().ok()?;
        let month = prefix[5..].parse().ok()?;
        Self::new(year, month)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn succ(&self) -> Self {
        self.add_months(1)
    }

    pub fn add_months(&self, months: u32) -> Self {
        let index = self.index() + months as i64;
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Chart label, e.g. `Jan 25`.
    pub fn label(&self) -> String {
        format!(
            "{} {:02}",
            MONTH_ABBREVIATIONS[(self.month - 1) as usize],
            self.year.rem_euclid(100)
        )
    }

    /// Every month from `self` through `end`, inclusive. Empty when
    /// `self > end`, so callers never step past the requested bound.
    pub fn iter_to(self, end: MonthKey) -> MonthIter {
        MonthIter {
            next: Some(self),
            end,
        }
    }

    fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MonthKey::from_date_str(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid month key '{raw}'")))
    }
}

pub struct MonthIter {
    next: Option<MonthKey>,
    end: MonthKey,
}

impl Iterator for MonthIter {
    type Item = MonthKey;

    fn next(&mut self) -> Option<MonthKey> {
        let current = self.next.filter(|m| *m <= self.end)?;
        self.next = Some(current.succ());
        Some(current)
    }
}

// ─── DateRange ──────────────────────────────────────────────────────────────

/// Inclusive `{start, end}` calendar range selected on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse `YYYY-MM-DD` bounds. A start after the end is accepted; such a
    /// range simply contains nothing.
    pub fn parse(start: &str, end: &str) -> InsightsResult<Self> {
        let parse = |value: &str| {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                InsightsError::InvalidDate {
                    value: value.to_string(),
                }
            })
        };
        Ok(Self::new(parse(start)?, parse(end)?))
    }

    /// The last `days` calendar days, `today` included. At least one day.
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        Self::new(today - Duration::days(days.max(1) - 1), today)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether a date string falls in range. Unparsable strings never do.
    pub fn contains_str(&self, value: &str) -> bool {
        parse_day(value).is_some_and(|d| self.contains(d))
    }

    pub fn start_month(&self) -> MonthKey {
        MonthKey::from_date(self.start)
    }

    pub fn end_month(&self) -> MonthKey {
        MonthKey::from_date(self.end)
    }

    /// Months touched by the range, in order.
    pub fn months(&self) -> MonthIter {
        if self.is_empty() {
            // An exhausted iterator: start past end.
            return self.end_month().succ().iter_to(self.end_month());
        }
        self.start_month().iter_to(self.end_month())
    }

    /// Number of calendar days covered, counting both ends.
    pub fn days(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() + 1
        }
    }

    /// The window of equal length immediately preceding this one.
    pub fn previous(&self) -> Self {
        let len = self.days().max(1);
        let end = self.start - Duration::days(1);
        Self::new(end - Duration::days(len - 1), end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn month_key_parses_prefix_only() {
        let key = MonthKey::from_date_str("2025-01-10T08:30:00Z").unwrap();
        assert_eq!(key.to_string(), "2025-01");
        assert_eq!(key.label(), "Jan 25");
        assert!(MonthKey::from_date_str("").is_none());
        assert!(MonthKey::from_date_str("2025-1-10").is_none());
        assert!(MonthKey::from_date_str("2025-13-01").is_none());
        assert!(MonthKey::from_date_str("abcd-ef").is_none());
    }

    #[test]
    fn month_key_order_matches_string_order() {
        let keys = ["2024-12", "2025-01", "2025-10", "2023-02", "2025-02"];
        let mut as_strings: Vec<String> = keys.iter().map(|s| s.to_string()).collect();
        let mut as_keys: Vec<MonthKey> =
            keys.iter().map(|s| MonthKey::from_date_str(s).unwrap()).collect();
        as_strings.sort();
        as_keys.sort();
        let rendered: Vec<String> = as_keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, as_strings);
    }

    #[test]
    fn month_arithmetic_wraps_years() {
        let nov = MonthKey::new(2024, 11).unwrap();
        assert_eq!(nov.add_months(3).to_string(), "2025-02");
        assert_eq!(nov.succ().succ().to_string(), "2025-01");
        assert_eq!(nov.add_months(14).to_string(), "2026-01");
    }

    #[test]
    fn iter_to_is_bounded() {
        let jan = MonthKey::new(2025, 1).unwrap();
        let mar = MonthKey::new(2025, 3).unwrap();
        assert_eq!(jan.iter_to(mar).count(), 3);
        assert_eq!(mar.iter_to(jan).count(), 0);
    }

    #[test]
    fn month_key_serializes_as_string() {
        let key = MonthKey::new(2025, 7).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2025-07\"");
        let back: MonthKey = serde_json::from_str("\"2025-07\"").unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn timestamps_parse_leniently() {
        assert!(parse_timestamp("2025-01-10T09:00:00Z").is_some());
        assert!(parse_timestamp("2025-01-10T09:00:00.123000").is_some());
        assert!(parse_timestamp("2025-01-10 09:00:00").is_some());
        assert!(parse_timestamp("2025-01-10").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn week_start_is_monday() {
        // 2025-01-15 is a Wednesday.
        assert_eq!(week_start(day("2025-01-15")), day("2025-01-13"));
        assert_eq!(week_start(day("2025-01-13")), day("2025-01-13"));
        assert_eq!(week_start(day("2025-01-19")), day("2025-01-13"));
    }

    #[test]
    fn range_previous_window_has_equal_length() {
        let range = DateRange::parse("2025-02-01", "2025-02-28").unwrap();
        assert_eq!(range.days(), 28);
        let prev = range.previous();
        assert_eq!(prev.end, day("2025-01-31"));
        assert_eq!(prev.start, day("2025-01-04"));
        assert_eq!(prev.days(), 28);
    }

    #[test]
    fn trailing_window_counts_today() {
        let window = DateRange::trailing(day("2025-06-30"), 30);
        assert_eq!(window.days(), 30);
        assert_eq!(window.start, day("2025-06-01"));
        assert!(!window.contains(day("2025-05-31")));
        assert!(window.contains(day("2025-06-01")));

        let single = DateRange::trailing(day("2025-06-30"), 0);
        assert_eq!(single.days(), 1);
        assert_eq!(single.start, day("2025-06-30"));
    }

    #[test]
    fn inverted_range_is_empty() {
        let range = DateRange::parse("2025-03-01", "2025-01-01").unwrap();
        assert!(range.is_empty());
        assert_eq!(range.days(), 0);
        assert_eq!(range.months().count(), 0);
        assert!(!range.contains_str("2025-02-01"));
    }

    #[test]
    fn range_parse_rejects_garbage() {
        let err = DateRange::parse("2025-01-01", "soon").unwrap_err();
        assert!(matches!(err, InsightsError::InvalidDate { .. }));
    }
}
