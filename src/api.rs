//! Ingestion boundary: fetch one **World Bank Indicators API (v2)** series for every
//! country and flatten it into [`IndicatorRecord`] rows.
//!
//! ### Notes
//! - The whole series is requested as **one page** (`per_page` defaults to 20 000, above the
//!   largest record count any indicator has). There is no pagination and no retry; if the
//!   metadata reports more than one page, a warning is logged.
//! - The API sometimes serializes `per_page` as a **string**; we accept both string/number.
//! - Errors come back as `[{"message": [...]}]`; they are surfaced as [`PipelineError::Data`].
//!
//! Typical usage:
//! ```no_run
//! # use birth_chance::api::{Client, IndicatorSource};
//! let client = Client::new("https://api.worldbank.org/v2", 20_000, 60)?;
//! let rows = client.fetch_indicator("SP.POP.TOTL")?;
//! # Ok::<(), birth_chance::PipelineError>(())
//! ```
use crate::error::{PipelineError, Result};
use crate::models::{Entry, IndicatorRecord, Meta};
use log::{debug, info, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Result of fetching one indicator: the flattened table or the reason it is missing.
pub type FetchOutcome = Result<Vec<IndicatorRecord>>;

/// Anything that can hand back one indicator series as flat records.
///
/// The pipeline only talks to this trait, so the transform stages can be driven by
/// fixture data instead of the live API.
pub trait IndicatorSource {
    fn fetch_indicator(&self, indicator: &str) -> FetchOutcome;
}

/// Synchronous HTTP client for the indicator endpoint.
#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    pub per_page: u32,
    http: HttpClient,
}

// Allow -, _, . unescaped in codes (common for indicator ids)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

impl Client {
    pub fn new(base_url: impl Into<String>, per_page: u32, timeout_secs: u64) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs)) // total request timeout
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("birth-chance/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            per_page,
            http,
        })
    }

    /// Endpoint for one indicator across all countries.
    pub fn indicator_url(&self, indicator: &str) -> String {
        format!(
            "{}/country/all/indicator/{}",
            self.base_url,
            percent_encoding::utf8_percent_encode(indicator.trim(), SAFE)
        )
    }

    /// GET `url?format=json&per_page=<per_page>` and flatten the records.
    ///
    /// ### Errors
    /// - [`PipelineError::Transport`] on connection failure or a non-2xx status
    /// - [`PipelineError::Data`] when the body is not `[metadata, records]`, the record
    ///   section is empty, or a `date` cannot be read as a year
    pub fn fetch_url(&self, url: &str, per_page: u32) -> FetchOutcome {
        debug!("GET {url} (per_page={per_page})");
        let resp = self
            .http
            .get(url)
            .query(&[("format", "json".to_string()), ("per_page", per_page.to_string())])
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::Transport(format!(
                "GET {url} failed with HTTP {status}"
            )));
        }
        let body: Value = resp
            .json()
            .map_err(|e| PipelineError::data(format!("response from {url} is not JSON: {e}")))?;
        parse_indicator_payload(&body)
    }
}

impl IndicatorSource for Client {
    fn fetch_indicator(&self, indicator: &str) -> FetchOutcome {
        let url = self.indicator_url(indicator);
        info!("fetching indicator {indicator}");
        let rows = self.fetch_url(&url, self.per_page)?;
        info!("indicator {indicator}: {} records", rows.len());
        Ok(rows)
    }
}

/// Flatten a decoded API body into records.
///
/// Expects `[metadata, [entry, ...]]`. Every entry's `date` must parse as an integer year;
/// the first one that does not fails the whole payload.
pub fn parse_indicator_payload(body: &Value) -> FetchOutcome {
    let arr = body
        .as_array()
        .ok_or_else(|| PipelineError::data("unexpected response shape: not a top-level array"))?;
    if arr.is_empty() {
        return Err(PipelineError::data("unexpected response: empty array"));
    }

    // If first element has "message", surface API error.
    if arr[0].get("message").is_some() {
        return Err(PipelineError::data(format!("world bank api error: {}", arr[0])));
    }

    let records = match arr.get(1) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Array(_)) | Some(Value::Null) | None => {
            return Err(PipelineError::data("no indicator records found in response"));
        }
        Some(other) => {
            return Err(PipelineError::data(format!(
                "unexpected record section: expected array, got {}",
                json_kind(other)
            )));
        }
    };

    match serde_json::from_value::<Meta>(arr[0].clone()) {
        Ok(meta) if meta.pages > 1 => warn!(
            "response holds page {} of {} ({} records in total); rows beyond per_page={} are not fetched",
            meta.page, meta.pages, meta.total, meta.per_page
        ),
        Ok(meta) => debug!("metadata: {} records on {} page(s)", meta.total, meta.pages),
        Err(e) => debug!("metadata not understood, ignoring: {e}"),
    }

    let entries: Vec<Entry> = serde_json::from_value(Value::Array(records.clone()))
        .map_err(|e| PipelineError::data(format!("malformed indicator record: {e}")))?;
    entries.into_iter().map(IndicatorRecord::try_from).collect()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// In-memory source keyed by indicator id, for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    series: HashMap<String, Vec<IndicatorRecord>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, indicator: impl Into<String>, rows: Vec<IndicatorRecord>) -> Self {
        self.series.insert(indicator.into(), rows);
        self
    }
}

impl IndicatorSource for StaticSource {
    fn fetch_indicator(&self, indicator: &str) -> FetchOutcome {
        match self.series.get(indicator) {
            Some(rows) if !rows.is_empty() => Ok(rows.clone()),
            _ => Err(PipelineError::data(format!(
                "no records for indicator {indicator}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indicator_url_encodes_code() {
        let c = Client::new("https://example.org/v2/", 10, 5).unwrap();
        assert_eq!(
            c.indicator_url("SP.DYN.CBRT.IN"),
            "https://example.org/v2/country/all/indicator/SP.DYN.CBRT.IN"
        );
        assert_eq!(
            c.indicator_url("A B"),
            "https://example.org/v2/country/all/indicator/A%20B"
        );
    }

    #[test]
    fn record_section_must_be_an_array() {
        let body = json!([{"page": 1, "pages": 1, "per_page": 50, "total": 1}, {"oops": 1}]);
        let err = parse_indicator_payload(&body).unwrap_err();
        assert!(err.to_string().contains("expected array, got object"));
    }

    #[test]
    fn static_source_reports_missing_series() {
        let src = StaticSource::new();
        assert!(matches!(
            src.fetch_indicator("SP.POP.TOTL"),
            Err(PipelineError::Data(_))
        ));
    }
}
