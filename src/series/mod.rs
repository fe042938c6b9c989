//! Alignment of sparse, independently-keyed forecast series.
//!
//! Each selected model yields its own date→value mapping, often with
//! different coverage. Charting needs one ordered table, so the aligner
//! outer-joins every series over the union of date-keys. Keys are opaque
//! strings and are deliberately not normalized across series: mismatched
//! granularities ("2010-01-01" vs "2010-01-01T00:00:00") stay distinct rows,
//! which mirrors what the backend actually emits per endpoint.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

pub mod color;

pub use color::{color_range, normalize_hue, ValueRange, NEUTRAL_HUE};

/// One model's sparse series. `BTreeMap` keeps iteration deterministic.
#[derive(Clone, Debug)]
pub struct ModelSeries {
    pub id: String,
    pub values: BTreeMap<String, f64>,
}

impl ModelSeries {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), values: BTreeMap::new() }
    }

    pub fn insert(&mut self, date_key: impl Into<String>, value: f64) {
        self.values.insert(date_key.into(), value);
    }
}

/// One output row. A model id maps to a cell iff its series contained this
/// exact date-key; missing is absent, never zero or null, so renderers can
/// tell "no data" from "value 0".
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AlignedRow {
    pub date: String,
    pub cells: BTreeMap<String, f64>,
}

impl AlignedRow {
    pub fn value(&self, model_id: &str) -> Option<f64> {
        self.cells.get(model_id).copied()
    }
}

/// Rows sorted ascending by the date-key parsed as a timestamp.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct AlignedTable {
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Parse a date-key for ordering only. Accepts RFC 3339, a bare
/// `YYYY-MM-DDTHH:MM:SS`, and a plain `YYYY-MM-DD` (midnight).
fn parse_date_key(key: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(key) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(key, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(key, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(d) = NaiveDate::parse_from_str(key, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}

/// Outer-join N sparse series into one ordered table.
///
/// Non-finite values are skipped as if that model had no data for that key.
/// Zero input series yields an empty table. The sort is stable, so distinct
/// keys that parse to the same timestamp (or fail to parse, sorting last)
/// keep first-encounter order.
pub fn align(series: &[ModelSeries]) -> AlignedTable {
    let mut by_date: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    let mut encounter: Vec<String> = Vec::new();

    for s in series {
        for (date_key, value) in &s.values {
            if !value.is_finite() {
                continue;
            }
            let cells = by_date.entry(date_key.clone()).or_insert_with(|| {
                encounter.push(date_key.clone());
                BTreeMap::new()
            });
            cells.insert(s.id.clone(), *value);
        }
    }

    let mut ordered = encounter;
    ordered.sort_by_key(|key| parse_date_key(key).unwrap_or(i64::MAX));

    let rows = ordered
        .into_iter()
        .filter_map(|date| {
            by_date.remove(&date).map(|cells| AlignedRow { date, cells })
        })
        .collect();

    AlignedTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(id: &str, points: &[(&str, f64)]) -> ModelSeries {
        let mut s = ModelSeries::new(id);
        for (k, v) in points {
            s.insert(*k, *v);
        }
        s
    }

    #[test]
    fn test_outer_join_union_of_keys() {
        let a = series("a", &[("2010-01-01", 1.0), ("2010-01-02", 2.0)]);
        let b = series("b", &[("2010-01-02", 20.0), ("2010-01-03", 30.0)]);

        let table = align(&[a, b]);
        assert_eq!(table.len(), 3);

        assert_eq!(table.rows[0].date, "2010-01-01");
        assert_eq!(table.rows[0].value("a"), Some(1.0));
        assert_eq!(table.rows[0].value("b"), None);

        assert_eq!(table.rows[1].date, "2010-01-02");
        assert_eq!(table.rows[1].value("a"), Some(2.0));
        assert_eq!(table.rows[1].value("b"), Some(20.0));

        assert_eq!(table.rows[2].date, "2010-01-03");
        assert_eq!(table.rows[2].value("a"), None);
        assert_eq!(table.rows[2].value("b"), Some(30.0));
    }

    #[test]
    fn test_rows_sorted_by_parsed_timestamp() {
        let a = series("a", &[("2011-06-01", 3.0), ("2009-12-31", 1.0), ("2010-05-10", 2.0)]);
        let table = align(&[a]);
        let dates: Vec<&str> = table.rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2009-12-31", "2010-05-10", "2011-06-01"]);
    }

    #[test]
    fn test_mixed_granularities_stay_distinct() {
        // Same instant, different key formats: two rows, plain date first is
        // not guaranteed by parse value (they tie) but the join never merges
        // them.
        let a = series("a", &[("2010-01-01", 1.0)]);
        let b = series("b", &[("2010-01-01T00:00:00", 2.0)]);
        let table = align(&[a, b]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].cells.len(), 1);
        assert_eq!(table.rows[1].cells.len(), 1);
    }

    #[test]
    fn test_tie_order_is_stable() {
        let a = series("a", &[("2010-01-01", 1.0)]);
        let b = series("b", &[("2010-01-01T00:00:00", 2.0)]);

        let t1 = align(&[a.clone(), b.clone()]);
        let t2 = align(&[a, b]);
        assert_eq!(t1, t2);
        // First-encounter order: series `a` was walked first.
        assert_eq!(t1.rows[0].date, "2010-01-01");
    }

    #[test]
    fn test_nan_values_skipped() {
        let a = series("a", &[("2010-01-01", f64::NAN), ("2010-01-02", 2.0)]);
        let table = align(&[a]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].date, "2010-01-02");
    }

    #[test]
    fn test_infinite_values_skipped() {
        let a = series("a", &[("2010-01-01", f64::INFINITY)]);
        let b = series("b", &[("2010-01-01", 5.0)]);
        let table = align(&[a, b]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].value("a"), None);
        assert_eq!(table.rows[0].value("b"), Some(5.0));
    }

    #[test]
    fn test_zero_series_empty_table() {
        let table = align(&[]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_unparseable_keys_sort_last() {
        let a = series("a", &[("not-a-date", 1.0), ("2010-01-01", 2.0)]);
        let table = align(&[a]);
        assert_eq!(table.rows[0].date, "2010-01-01");
        assert_eq!(table.rows[1].date, "not-a-date");
    }

    #[test]
    fn test_rfc3339_and_space_separated_parse() {
        assert!(parse_date_key("2010-01-01T00:00:00Z").is_some());
        assert!(parse_date_key("2010-01-01 06:30:00").is_some());
        assert_eq!(
            parse_date_key("2010-01-01"),
            parse_date_key("2010-01-01T00:00:00")
        );
    }
}
