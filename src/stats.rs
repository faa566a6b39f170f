use crate::models::EstimatedRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Coverage of the estimated table, as printed before the charts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub min_year: i32,
    pub max_year: i32,
    /// Distinct country codes.
    pub countries: usize,
    /// Mean birth rate over all rows (per 1,000 people).
    pub mean_birth_rate: f64,
}

/// `None` for an empty table.
pub fn dataset_summary(rows: &[EstimatedRecord]) -> Option<DatasetSummary> {
    let min_year = rows.iter().map(|r| r.year).min()?;
    let max_year = rows.iter().map(|r| r.year).max()?;
    let countries: BTreeSet<&str> = rows.iter().map(|r| r.country_code.as_str()).collect();
    let mean_birth_rate = rows.iter().map(|r| r.birth_rate).sum::<f64>() / rows.len() as f64;
    Some(DatasetSummary {
        rows: rows.len(),
        min_year,
        max_year,
        countries: countries.len(),
        mean_birth_rate,
    })
}

/// Inclusive `(start, end)` of the last `years` years ending at `max_year`.
///
/// The start saturates at `i32::MIN` instead of overflowing.
pub fn recent_window(max_year: i32, years: u32) -> (i32, i32) {
    let span = i32::try_from(years.max(1) - 1).unwrap_or(i32::MAX);
    (max_year.saturating_sub(span), max_year)
}

fn in_window(year: i32, window: (i32, i32)) -> bool {
    year >= window.0 && year <= window.1
}

/// Mean birth rate across all countries per year inside `window`, ascending by year.
pub fn yearly_mean_birth_rate(rows: &[EstimatedRecord], window: (i32, i32)) -> Vec<(i32, f64)> {
    let mut acc: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for r in rows.iter().filter(|r| in_window(r.year, window)) {
        let e = acc.entry(r.year).or_default();
        e.0 += r.birth_rate;
        e.1 += 1;
    }
    acc.into_iter()
        .map(|(y, (sum, n))| (y, sum / n as f64))
        .collect()
}

/// One country's rows inside `window`, ascending by year.
pub fn country_rows<'a>(
    rows: &'a [EstimatedRecord],
    country_code: &str,
    window: (i32, i32),
) -> Vec<&'a EstimatedRecord> {
    let mut out: Vec<&EstimatedRecord> = rows
        .iter()
        .filter(|r| r.country_code == country_code && in_window(r.year, window))
        .collect();
    out.sort_by_key(|r| r.year);
    out
}
