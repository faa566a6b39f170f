use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// ISO3 code of the country whose share of births is tracked.
pub const CANADA_ISO3: &str = "CAN";

/// Metadata section returned by the API (position 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub page: u32,
    pub pages: u32,
    /// Some responses encode `per_page` as a string, others as a number.
    /// Accept both and normalize to `u32`.
    #[serde(deserialize_with = "de_u32_from_string_or_number")]
    pub per_page: u32,
    pub total: u32,
}

/// Serde helper: parse `u32` from either a JSON number or a string.
fn de_u32_from_string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct U32Visitor;

    impl<'de> Visitor<'de> for U32Visitor {
        type Value = u32;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or integer representing a non-negative number")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(v).map_err(E::custom)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(v).map_err(|_| E::custom("negative or oversized value for u32"))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            s.trim().parse::<u32>().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(U32Visitor)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeName {
    pub id: String,
    pub value: String,
}

/// Raw entry from the API (position 1 array).
///
/// Only `countryiso3code`, `date` and `value` are relied upon; the rest is
/// kept for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub indicator: Option<CodeName>,
    pub country: Option<CodeName>,
    #[serde(default)]
    pub countryiso3code: String,
    pub date: String,
    pub value: Option<f64>,
}

/// One observation of one indicator: (country, year, value).
///
/// `country_code` is ISO3 and may be empty for aggregate regions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorRecord {
    pub country_code: String,
    pub year: i32,
    pub value: Option<f64>,
}

impl TryFrom<Entry> for IndicatorRecord {
    type Error = PipelineError;

    fn try_from(e: Entry) -> Result<Self, Self::Error> {
        let year = e.date.trim().parse::<i32>().map_err(|_| {
            PipelineError::data(format!(
                "cannot coerce date {:?} to a year (country {:?})",
                e.date, e.countryiso3code
            ))
        })?;
        Ok(Self {
            country_code: e.countryiso3code,
            year,
            value: e.value,
        })
    }
}

/// Birth rate and population for the same (country, year); both present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinedRecord {
    pub country_code: String,
    pub year: i32,
    /// Live births per 1,000 people.
    pub birth_rate: f64,
    pub population: f64,
}

/// A joined row plus its derived absolute birth count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstimatedRecord {
    pub country_code: String,
    pub year: i32,
    pub birth_rate: f64,
    pub population: f64,
    pub number_of_births: f64,
}

/// Per-year share of estimated births that happened in Canada.
///
/// `canada_births` and `total_births` are display values rounded to whole
/// births; `chance_percent` is computed from the unrounded sums.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YearlySummary {
    pub year: i32,
    pub canada_births: f64,
    pub total_births: f64,
    pub chance_percent: f64,
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
