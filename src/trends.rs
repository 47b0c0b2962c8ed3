// Calendar-month bucketing for trend series.
//
// Portal dates are `DD-Mon-YYYY` text. Each dated value is mapped to a
// `YearMonth` key and summed per key. Months without activity are left out
// of the series (no zero-fill); callers charting the series must not assume
// consecutive months.
use crate::types::MonthlyPoint;
use crate::util::parse_portal_date;
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(d: NaiveDate) -> Self {
        Self {
            year: d.year(),
            month: d.month(),
        }
    }

    /// Parse a portal date and return its month bucket.
    pub fn from_portal_date(s: &str) -> Option<Self> {
        parse_portal_date(s).map(Self::from_date)
    }

    /// The month `n` months before this one.
    pub fn months_back(self, n: u32) -> Self {
        let index = self.year as i64 * 12 + (self.month as i64 - 1) - n as i64;
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inclusive trailing window of whole calendar months ending at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: YearMonth,
    pub end: YearMonth,
}

impl MonthWindow {
    /// The last `months` months up to and including `end`. `months` is
    /// clamped to at least one.
    pub fn trailing(end: YearMonth, months: u32) -> Self {
        let span = months.max(1) - 1;
        Self {
            start: end.months_back(span),
            end,
        }
    }

    pub fn contains(&self, ym: YearMonth) -> bool {
        self.start <= ym && ym <= self.end
    }
}

/// Result of bucketing: the ordered series plus how many items had a date
/// that could not be parsed (or no date at all).
#[derive(Debug, Clone, PartialEq)]
pub struct Bucketed<V> {
    pub series: Vec<MonthlyPoint<V>>,
    pub skipped: usize,
}

/// Group `value_of(item)` by the calendar month of `date_of(item)`.
///
/// The series is chronological ascending. Items without a parseable date
/// are skipped and counted rather than aborting the whole series.
pub fn bucket_by_month<'a, T, V, D, F>(
    items: impl IntoIterator<Item = &'a T>,
    date_of: D,
    value_of: F,
) -> Bucketed<V>
where
    T: 'a,
    V: Default + Copy + AddAssign,
    D: Fn(&T) -> Option<&str>,
    F: Fn(&T) -> V,
{
    let mut buckets: BTreeMap<YearMonth, V> = BTreeMap::new();
    let mut skipped = 0usize;
    for item in items {
        match date_of(item).and_then(YearMonth::from_portal_date) {
            Some(ym) => *buckets.entry(ym).or_default() += value_of(item),
            None => skipped += 1,
        }
    }
    Bucketed {
        series: buckets
            .into_iter()
            .map(|(month, value)| MonthlyPoint { month, value })
            .collect(),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        date: Option<&'static str>,
        amount: i64,
    }

    fn row(date: &'static str, amount: i64) -> Row {
        Row {
            date: Some(date),
            amount,
        }
    }

    #[test]
    fn buckets_are_chronological_and_not_zero_filled() {
        let rows = vec![
            row("15-Mar-2026", 5),
            row("09-Jan-2026", 10),
            row("28-Jan-2026", 1),
            row("01-Dec-2025", 7),
        ];
        let out = bucket_by_month(&rows, |r| r.date, |r| r.amount);
        let months: Vec<String> = out.series.iter().map(|p| p.month.to_string()).collect();
        assert_eq!(months, vec!["2025-12", "2026-01", "2026-03"]);
        assert_eq!(out.series[1].value, 11);
        assert_eq!(out.skipped, 0);
    }

    #[test]
    fn bad_dates_are_skipped_not_fatal() {
        let rows = vec![
            row("31-Feb-2026", 100),
            row("not a date", 100),
            Row {
                date: None,
                amount: 100,
            },
            row("02-Feb-2026", 3),
        ];
        let out = bucket_by_month(&rows, |r| r.date, |r| r.amount);
        assert_eq!(out.skipped, 3);
        assert_eq!(out.series.len(), 1);
        assert_eq!(out.series[0].value, 3);
    }

    #[test]
    fn counting_measure() {
        let rows = vec![row("01-Feb-2026", 0), row("03-Feb-2026", 0)];
        let out = bucket_by_month(&rows, |r| r.date, |_| 1usize);
        assert_eq!(out.series[0].value, 2);
    }

    #[test]
    fn months_back_crosses_years() {
        let jan = YearMonth::new(2026, 1).unwrap();
        assert_eq!(jan.months_back(1), YearMonth::new(2025, 12).unwrap());
        assert_eq!(jan.months_back(13), YearMonth::new(2024, 12).unwrap());
        assert_eq!(jan.months_back(0), jan);
    }

    #[test]
    fn trailing_window_is_inclusive_and_clamped() {
        let end = YearMonth::new(2026, 3).unwrap();
        let w = MonthWindow::trailing(end, 3);
        assert!(w.contains(YearMonth::new(2026, 1).unwrap()));
        assert!(w.contains(end));
        assert!(!w.contains(YearMonth::new(2025, 12).unwrap()));

        let w0 = MonthWindow::trailing(end, 0);
        assert_eq!(w0.start, end);
    }

    #[test]
    fn serializes_as_year_month() {
        let ym = YearMonth::new(2026, 1).unwrap();
        assert_eq!(serde_json::to_string(&ym).unwrap(), "\"2026-01\"");
    }
}
