//! Join the two indicator tables and derive absolute birth counts.

use crate::api::FetchOutcome;
use crate::error::{PipelineError, Result};
use crate::models::{EstimatedRecord, IndicatorRecord, JoinedRecord};
use log::{debug, warn};
use std::collections::BTreeMap;

type Key = (String, i32);

/// Index a table by (country_code, year), rejecting duplicate keys.
///
/// Rows without a country code cannot be keyed and are skipped.
fn index_by_key(
    rows: &[IndicatorRecord],
    table: &str,
) -> Result<BTreeMap<Key, Option<f64>>> {
    let mut out = BTreeMap::new();
    let mut unkeyed = 0usize;
    for r in rows {
        if r.country_code.trim().is_empty() {
            unkeyed += 1;
            continue;
        }
        let key = (r.country_code.clone(), r.year);
        if out.insert(key, r.value).is_some() {
            return Err(PipelineError::data(format!(
                "duplicate ({:?}, {}) in {table} table",
                r.country_code, r.year
            )));
        }
    }
    if unkeyed > 0 {
        warn!("{table} table: skipped {unkeyed} rows without a country code");
    }
    Ok(out)
}

/// Inner join on (country_code, year), dropping rows where either value is absent.
///
/// Output is ordered by (country_code, year). Duplicate keys in either input are a
/// [`PipelineError::Data`]; they are not silently resolved.
pub fn join(
    birth_rates: &[IndicatorRecord],
    populations: &[IndicatorRecord],
) -> Result<Vec<JoinedRecord>> {
    let rates = index_by_key(birth_rates, "birth rate")?;
    let pops = index_by_key(populations, "population")?;

    let mut dropped = 0usize;
    let mut out = Vec::with_capacity(rates.len().min(pops.len()));
    for ((country_code, year), rate) in rates {
        let Some(pop) = pops.get(&(country_code.clone(), year)) else {
            continue;
        };
        match (rate, *pop) {
            (Some(birth_rate), Some(population)) => out.push(JoinedRecord {
                country_code,
                year,
                birth_rate,
                population,
            }),
            _ => dropped += 1,
        }
    }
    debug!(
        "joined {} rows, dropped {} with a missing value",
        out.len(),
        dropped
    );
    Ok(out)
}

/// Join two fetch outcomes, refusing to run unless both succeeded.
///
/// When either side failed the error names every failed indicator together with its reason.
pub fn join_outcomes(
    birth_rates: FetchOutcome,
    populations: FetchOutcome,
) -> Result<Vec<JoinedRecord>> {
    match (birth_rates, populations) {
        (Ok(rates), Ok(pops)) => join(&rates, &pops),
        (rates, pops) => {
            let failures = [("birth rate", rates.err()), ("population", pops.err())]
                .into_iter()
                .filter_map(|(name, e)| e.map(|e| format!("{name}: {e}")))
                .collect();
            Err(PipelineError::UpstreamFetch { failures })
        }
    }
}

/// Births in one row: `(birth_rate / 1000) * population`.
#[inline]
pub fn births(birth_rate: f64, population: f64) -> f64 {
    (birth_rate / 1000.0) * population
}

/// Per-row derivation of `number_of_births`. Negative or zero rates are not special-cased.
pub fn estimate(joined: &[JoinedRecord]) -> Vec<EstimatedRecord> {
    joined
        .iter()
        .map(|j| EstimatedRecord {
            country_code: j.country_code.clone(),
            year: j.year,
            birth_rate: j.birth_rate,
            population: j.population,
            number_of_births: births(j.birth_rate, j.population),
        })
        .collect()
}
