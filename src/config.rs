//! Run configuration. Every field has a default, so an empty (or absent) TOML file reproduces
//! the stock run: both World Bank series fetched in one page each, output in the current
//! directory.
//!
//! ```toml
//! [api]
//! per_page = 25000
//!
//! [output]
//! dir = "out"
//!
//! [charts]
//! window_years = 15
//! ```

use crate::error::{PipelineError, Result};
use crate::storage::is_sql_identifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound for `charts.window_years`.
pub const MAX_WINDOW_YEARS: u32 = 1000;
/// Upper bound for either chart dimension, in pixels.
pub const MAX_CHART_PX: u32 = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api: ApiConfig,
    pub output: OutputConfig,
    pub charts: ChartConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    /// Crude birth rate (per 1,000 people).
    pub birth_rate_indicator: String,
    /// Total population.
    pub population_indicator: String,
    /// Upper bound on records per indicator; everything must fit in one page.
    pub per_page: u32,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.worldbank.org/v2".into(),
            birth_rate_indicator: "SP.DYN.CBRT.IN".into(),
            population_indicator: "SP.POP.TOTL".into(),
            per_page: 20_000,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory all files below are written to.
    pub dir: PathBuf,
    pub database: String,
    pub table: String,
    pub global_birth_rate_chart: String,
    pub canada_birth_rate_chart: String,
    pub canada_population_chart: String,
    pub chance_chart: String,
    /// Optional CSV/JSON copy of the yearly summary.
    pub export: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            database: "birth_stats.db".into(),
            table: "birth_data".into(),
            global_birth_rate_chart: "global_average_birth_rate.png".into(),
            canada_birth_rate_chart: "canada_birth_rate.png".into(),
            canada_population_chart: "canada_population.png".into(),
            chance_chart: "chance_of_being_born_in_canada.html".into(),
            export: None,
        }
    }
}

impl OutputConfig {
    /// `name` resolved against the output directory.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// Static charts show the last `window_years` years of data.
    pub window_years: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 800,
            window_years: 10,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content)
            .map_err(|e| PipelineError::config(format!("invalid TOML: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.api.base_url)
            .map_err(|e| PipelineError::config(format!("api.base_url: {e}")))?;
        for (field, value) in [
            ("api.birth_rate_indicator", &self.api.birth_rate_indicator),
            ("api.population_indicator", &self.api.population_indicator),
            ("output.database", &self.output.database),
            ("output.global_birth_rate_chart", &self.output.global_birth_rate_chart),
            ("output.canada_birth_rate_chart", &self.output.canada_birth_rate_chart),
            ("output.canada_population_chart", &self.output.canada_population_chart),
            ("output.chance_chart", &self.output.chance_chart),
        ] {
            if value.trim().is_empty() {
                return Err(PipelineError::config(format!("{field} must not be empty")));
            }
        }
        if self.api.per_page == 0 {
            return Err(PipelineError::config("api.per_page must be at least 1"));
        }
        if self.api.timeout_secs == 0 {
            return Err(PipelineError::config("api.timeout_secs must be at least 1"));
        }
        if !is_sql_identifier(&self.output.table) {
            return Err(PipelineError::config(format!(
                "output.table {:?} must match [A-Za-z_][A-Za-z0-9_]*",
                self.output.table
            )));
        }
        if !(1..=MAX_WINDOW_YEARS).contains(&self.charts.window_years) {
            return Err(PipelineError::config(format!(
                "charts.window_years must be between 1 and {MAX_WINDOW_YEARS}"
            )));
        }
        if self.charts.width < 200 || self.charts.height < 150 {
            return Err(PipelineError::config(
                "charts.width/height must be at least 200x150",
            ));
        }
        if self.charts.width > MAX_CHART_PX || self.charts.height > MAX_CHART_PX {
            return Err(PipelineError::config(format!(
                "charts.width/height must be at most {MAX_CHART_PX}"
            )));
        }
        Ok(())
    }
}
