//! The whole run, strictly forward: fetch → join → estimate → report/persist/aggregate → charts.
//!
//! Fetch and join failures end the run with an error, since nothing downstream can be computed.
//! Failures after that (one chart, the database, the export) are recorded in the
//! [`RunReport`] and the remaining outputs are still produced.

use crate::aggregate::aggregate;
use crate::api::IndicatorSource;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::models::{CANADA_ISO3, EstimatedRecord, YearlySummary};
use crate::stats::{self, DatasetSummary};
use crate::transform::{estimate, join_outcomes};
use crate::viz::{self, ValueFormat, YearChart};
use crate::{report, storage};
use log::{error, info, warn};
use std::fs;
use std::path::PathBuf;

/// A stage that failed without stopping the run.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: &'static str,
    pub error: PipelineError,
}

/// What one run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub summary: Option<DatasetSummary>,
    pub yearly: Vec<YearlySummary>,
    /// Files written, in order.
    pub written: Vec<PathBuf>,
    pub failures: Vec<StageFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, stage: &'static str, error: PipelineError) {
        error!("{stage} failed: {error}");
        self.failures.push(StageFailure { stage, error });
    }

    /// Record a written file and announce it with `notice` on stdout.
    fn wrote(&mut self, notice: &str, path: PathBuf) {
        println!("{notice} '{}'", path.display());
        self.written.push(path);
    }
}

/// Fetch both indicators from `source` and produce every output described by `cfg`.
pub fn run(cfg: &Config, source: &dyn IndicatorSource) -> Result<RunReport> {
    let birth_rates = source.fetch_indicator(&cfg.api.birth_rate_indicator);
    if let Err(e) = &birth_rates {
        error!("birth rate indicator {}: {e}", cfg.api.birth_rate_indicator);
    }
    let populations = source.fetch_indicator(&cfg.api.population_indicator);
    if let Err(e) = &populations {
        error!("population indicator {}: {e}", cfg.api.population_indicator);
    }

    let joined = join_outcomes(birth_rates, populations)?;
    if joined.is_empty() {
        return Err(PipelineError::data(
            "no country-year has both a birth rate and a population",
        ));
    }
    let estimates = estimate(&joined);
    info!("estimated births for {} country-years", estimates.len());

    let mut outcome = RunReport::default();
    let summary = stats::dataset_summary(&estimates)
        .ok_or_else(|| PipelineError::data("estimated table is empty"))?;
    if let Err(e) = report::print_dataset_summary(&summary) {
        outcome.fail("console summary", e.into());
    }

    fs::create_dir_all(&cfg.output.dir)?;
    render_static_charts(cfg, &estimates, summary.max_year, &mut outcome);

    let yearly = match persist_and_query(cfg, &estimates) {
        Ok(rows) => {
            println!("Data loaded into SQLite successfully.");
            outcome
                .written
                .push(cfg.output.path_for(&cfg.output.database));
            rows
        }
        Err(e) => {
            outcome.fail("database", e);
            warn!("falling back to the in-memory yearly aggregation");
            aggregate(&estimates)
        }
    };

    if let Err(e) = report::print_yearly_table(&yearly) {
        outcome.fail("console table", e.into());
    }

    let chance_path = cfg.output.path_for(&cfg.output.chance_chart);
    match viz::write_chance_chart(&yearly, &chance_path) {
        Ok(()) => outcome.wrote("Interactive chart saved as", chance_path),
        Err(e) => outcome.fail("interactive chart", e),
    }

    if let Some(export) = &cfg.output.export {
        match storage::save_summary(&yearly, export) {
            Ok(()) => {
                info!("saved {} summary rows to {}", yearly.len(), export.display());
                outcome.written.push(export.clone());
            }
            Err(e) => outcome.fail("export", e),
        }
    }

    outcome.summary = Some(summary);
    outcome.yearly = yearly;
    Ok(outcome)
}

/// Replace the estimates table and read the yearly summary back through SQL.
fn persist_and_query(cfg: &Config, estimates: &[EstimatedRecord]) -> Result<Vec<YearlySummary>> {
    let path = cfg.output.path_for(&cfg.output.database);
    let mut conn = storage::open(&path)?;
    storage::write_estimates(&mut conn, &cfg.output.table, estimates)?;
    storage::query_yearly_summary(&conn, &cfg.output.table)
}

fn render_static_charts(
    cfg: &Config,
    estimates: &[EstimatedRecord],
    max_year: i32,
    outcome: &mut RunReport,
) {
    let window = stats::recent_window(max_year, cfg.charts.window_years);
    let (width, height) = (cfg.charts.width, cfg.charts.height);

    let global = stats::yearly_mean_birth_rate(estimates, window);
    let canada = stats::country_rows(estimates, CANADA_ISO3, window);
    if canada.is_empty() {
        warn!(
            "no {CANADA_ISO3} rows in {}-{}; Canada charts will be empty",
            window.0, window.1
        );
    }
    let canada_rate: Vec<(i32, f64)> = canada.iter().map(|r| (r.year, r.birth_rate)).collect();
    let canada_pop: Vec<(i32, f64)> = canada.iter().map(|r| (r.year, r.population)).collect();

    let charts = [
        (
            "global birth rate chart",
            &cfg.output.global_birth_rate_chart,
            YearChart {
                title: "Global Average Birth Rate Over Time",
                y_desc: "Birth Rate (per 1,000 people)",
                window,
                points: &global,
                format: ValueFormat::Rate,
            },
        ),
        (
            "Canada birth rate chart",
            &cfg.output.canada_birth_rate_chart,
            YearChart {
                title: "Canada Birth Rate Over Time",
                y_desc: "Birth Rate (per 1,000 people)",
                window,
                points: &canada_rate,
                format: ValueFormat::Rate,
            },
        ),
        (
            "Canada population chart",
            &cfg.output.canada_population_chart,
            YearChart {
                title: "Canada Population Over Time",
                y_desc: "Population",
                window,
                points: &canada_pop,
                format: ValueFormat::Millions,
            },
        ),
    ];

    for (stage, file, chart) in charts {
        let path = cfg.output.path_for(file);
        match viz::plot_year_chart(&chart, &path, width, height) {
            Ok(()) => outcome.wrote("Figure saved as", path),
            Err(e) => outcome.fail(stage, e),
        }
    }
}
