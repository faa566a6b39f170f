//! Full runs driven by fixture data instead of the live API.

use birth_chance::api::{FetchOutcome, IndicatorSource};
use birth_chance::models::IndicatorRecord;
use birth_chance::{Config, PipelineError, StaticSource, pipeline, storage};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const RATE: &str = "SP.DYN.CBRT.IN";
const POP: &str = "SP.POP.TOTL";

fn rec(c: &str, y: i32, v: Option<f64>) -> IndicatorRecord {
    IndicatorRecord {
        country_code: c.into(),
        year: y,
        value: v,
    }
}

fn fixture() -> StaticSource {
    let mut rates = Vec::new();
    let mut pops = Vec::new();
    for (i, year) in (2010..=2023).enumerate() {
        let i = i as f64;
        rates.push(rec("CAN", year, Some(11.2 - i * 0.12)));
        pops.push(rec("CAN", year, Some(34_000_000.0 + i * 400_000.0)));
        rates.push(rec("USA", year, Some(13.0 - i * 0.1)));
        pops.push(rec("USA", year, Some(309_000_000.0 + i * 2_000_000.0)));
        rates.push(rec("WLD", year, Some(19.5 - i * 0.2)));
        pops.push(rec("WLD", year, Some(6_950_000_000.0 + i * 80_000_000.0)));
    }
    // Latest year published for population only.
    pops.push(rec("CAN", 2024, Some(41_000_000.0)));
    // Missing value is dropped, not imputed.
    rates.push(rec("MEX", 2023, None));
    pops.push(rec("MEX", 2023, Some(128_000_000.0)));
    StaticSource::new().with(RATE, rates).with(POP, pops)
}

fn config_in(dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.output.dir = dir.to_path_buf();
    cfg.charts.width = 800;
    cfg.charts.height = 400;
    cfg
}

#[test]
fn run_writes_every_output() {
    let dir = tempdir().unwrap();
    let cfg = config_in(dir.path());
    let report = pipeline::run(&cfg, &fixture()).unwrap();
    assert!(report.is_success(), "{:?}", report.failures);

    for name in [
        "global_average_birth_rate.png",
        "canada_birth_rate.png",
        "canada_population.png",
        "chance_of_being_born_in_canada.html",
        "birth_stats.db",
    ] {
        let p = dir.path().join(name);
        assert!(p.exists(), "{name} missing");
        assert!(fs::metadata(&p).unwrap().len() > 0, "{name} empty");
    }

    let summary = report.summary.unwrap();
    assert_eq!((summary.min_year, summary.max_year), (2010, 2023));
    assert_eq!(summary.countries, 3);

    let years: Vec<i32> = report.yearly.iter().map(|r| r.year).collect();
    assert_eq!(years, (2010..=2023).rev().collect::<Vec<_>>());
    for r in &report.yearly {
        assert!(r.canada_births <= r.total_births);
        assert!(r.chance_percent > 0.0 && r.chance_percent < 100.0);
    }
}

#[test]
fn second_run_is_identical() {
    let dir = tempdir().unwrap();
    let cfg = config_in(dir.path());
    let first = pipeline::run(&cfg, &fixture()).unwrap();
    let second = pipeline::run(&cfg, &fixture()).unwrap();
    assert_eq!(first.yearly, second.yearly);

    let conn = storage::open(dir.path().join("birth_stats.db")).unwrap();
    let rows = storage::read_estimates(&conn, "birth_data").unwrap();
    assert_eq!(rows.len(), 14 * 3);
}

#[test]
fn export_follows_extension() {
    let dir = tempdir().unwrap();
    let mut cfg = config_in(dir.path());
    let export = dir.path().join("summary.csv");
    cfg.output.export = Some(export.clone());
    let report = pipeline::run(&cfg, &fixture()).unwrap();
    assert!(report.written.contains(&export));
    let text = fs::read_to_string(&export).unwrap();
    assert_eq!(text.lines().count(), 1 + report.yearly.len());
}

#[test]
fn failed_fetch_stops_before_any_output() {
    let dir = tempdir().unwrap();
    let cfg = config_in(dir.path());
    let source = StaticSource::new().with(RATE, vec![rec("CAN", 2020, Some(10.0))]);
    let err = pipeline::run(&cfg, &source).unwrap_err();
    assert!(matches!(err, PipelineError::UpstreamFetch { .. }), "{err}");
    assert!(!dir.path().join("birth_stats.db").exists());
}

#[test]
fn disjoint_tables_are_a_data_error() {
    let dir = tempdir().unwrap();
    let cfg = config_in(dir.path());
    let source = StaticSource::new()
        .with(RATE, vec![rec("CAN", 2020, Some(10.0))])
        .with(POP, vec![rec("CAN", 2021, Some(38_000_000.0))]);
    let err = pipeline::run(&cfg, &source).unwrap_err();
    assert!(matches!(err, PipelineError::Data(_)), "{err}");
}

/// A source whose population series has no Canada at all.
struct NoCanada(StaticSource);

impl IndicatorSource for NoCanada {
    fn fetch_indicator(&self, indicator: &str) -> FetchOutcome {
        let rows = self.0.fetch_indicator(indicator)?;
        Ok(rows.into_iter().filter(|r| r.country_code != "CAN").collect())
    }
}

#[test]
fn missing_canada_still_produces_all_charts() {
    let dir = tempdir().unwrap();
    let cfg = config_in(dir.path());
    let report = pipeline::run(&cfg, &NoCanada(fixture())).unwrap();
    assert!(report.is_success(), "{:?}", report.failures);
    assert!(dir.path().join("canada_birth_rate.png").exists());
    assert!(report.yearly.iter().all(|r| r.chance_percent == 0.0));
}

#[test]
fn database_failure_falls_back_to_in_memory_summary() {
    let dir = tempdir().unwrap();
    let mut cfg = config_in(dir.path());
    // A directory where the database file should be cannot be opened as SQLite.
    fs::create_dir(dir.path().join("birth_stats.db")).unwrap();
    cfg.output.database = "birth_stats.db".into();
    let report = pipeline::run(&cfg, &fixture()).unwrap();
    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, "database");
    assert_eq!(report.yearly.len(), 14);
    assert!(dir.path().join("chance_of_being_born_in_canada.html").exists());
}
