//! birth_chance
//!
//! Estimates, per year, the chance that a birth among all countries reporting to the World
//! Bank happened in Canada. Pairs with the `birth-chance` CLI.
//!
//! ### Pipeline
//! - Fetch crude birth rate (`SP.DYN.CBRT.IN`) and total population (`SP.POP.TOTL`) for
//!   every country, one page each
//! - Inner-join on (country, year), dropping rows with a missing value
//! - Estimate births per row as `(birth_rate / 1000) * population`
//! - Persist the table to SQLite and aggregate per year: Canada's births, all births, share in %
//! - Print summary statistics, render three PNG charts and one interactive HTML chart
//!
//! ### Example
//! ```no_run
//! use birth_chance::{Client, Config, pipeline};
//!
//! let cfg = Config::default();
//! let client = Client::new(&cfg.api.base_url, cfg.api.per_page, cfg.api.timeout_secs)?;
//! let report = pipeline::run(&cfg, &client)?;
//! for row in report.yearly.iter().take(3) {
//!     println!("{}: {:.3}%", row.year, row.chance_percent);
//! }
//! # Ok::<(), birth_chance::PipelineError>(())
//! ```

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod storage;
pub mod transform;
pub mod viz;

pub use api::{Client, IndicatorSource, StaticSource};
pub use config::Config;
pub use error::PipelineError;
pub use models::{EstimatedRecord, IndicatorRecord, JoinedRecord, YearlySummary};
