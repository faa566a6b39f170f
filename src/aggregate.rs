use crate::models::{CANADA_ISO3, EstimatedRecord, YearlySummary, round_to};
use log::warn;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy)]
struct YearTotals {
    canada: f64,
    total: f64,
}

/// Group estimated births by year and compute Canada's share, newest year first.
///
/// `chance_percent` is `100 * canada / total` on the unrounded sums, then rounded to
/// 3 decimals; the two birth columns are rounded to whole births for display.
/// A year whose total is exactly zero has no defined share and is left out.
pub fn aggregate(rows: &[EstimatedRecord]) -> Vec<YearlySummary> {
    let mut by_year: BTreeMap<i32, YearTotals> = BTreeMap::new();
    for r in rows {
        let t = by_year.entry(r.year).or_default();
        if r.country_code == CANADA_ISO3 {
            t.canada += r.number_of_births;
        }
        t.total += r.number_of_births;
    }

    by_year
        .into_iter()
        .rev()
        .filter_map(|(year, t)| {
            if t.total == 0.0 {
                warn!("{year}: total births are zero, year left out of the summary");
                return None;
            }
            Some(YearlySummary {
                year,
                canada_births: round_to(t.canada, 0),
                total_births: round_to(t.total, 0),
                chance_percent: round_to(100.0 * t.canada / t.total, 3),
            })
        })
        .collect()
}
