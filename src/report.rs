//! Console output: coverage summary and the yearly table.

use crate::models::YearlySummary;
use crate::stats::DatasetSummary;
use num_format::{Locale, ToFormattedString};
use std::io::{self, Write};

/// Whole number with thousands separators; non-finite values print as `NA`.
pub fn fmt_count(v: f64) -> String {
    if v.is_finite() {
        (v.round() as i64).to_formatted_string(&Locale::en)
    } else {
        "NA".to_string()
    }
}

pub fn write_dataset_summary<W: Write>(out: &mut W, s: &DatasetSummary) -> io::Result<()> {
    writeln!(out, "=== SUMMARY STATISTICS ===")?;
    writeln!(out)?;
    writeln!(out, "Global Data Summary:")?;
    writeln!(out, "Years covered: {} - {}", s.min_year, s.max_year)?;
    writeln!(out, "Number of countries: {}", s.countries)?;
    writeln!(
        out,
        "Average global birth rate: {:.2} per 1,000 people",
        s.mean_birth_rate
    )?;
    Ok(())
}

/// Every row of the summary, in the order given.
pub fn write_yearly_table<W: Write>(out: &mut W, rows: &[YearlySummary]) -> io::Result<()> {
    writeln!(
        out,
        "{:>6}  {:>15}  {:>17}  {:>14}",
        "year", "canada_births", "total_births", "chance_percent"
    )?;
    for r in rows {
        writeln!(
            out,
            "{:>6}  {:>15}  {:>17}  {:>14.3}",
            r.year,
            fmt_count(r.canada_births),
            fmt_count(r.total_births),
            r.chance_percent
        )?;
    }
    Ok(())
}

pub fn print_dataset_summary(s: &DatasetSummary) -> io::Result<()> {
    write_dataset_summary(&mut io::stdout().lock(), s)
}

pub fn print_yearly_table(rows: &[YearlySummary]) -> io::Result<()> {
    write_yearly_table(&mut io::stdout().lock(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lines() {
        let rows = vec![YearlySummary {
            year: 2020,
            canada_births: 399_000.0,
            total_births: 140_000_000.0,
            chance_percent: 0.285,
        }];
        let mut buf = Vec::new();
        write_yearly_table(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("399,000"));
        assert!(lines[1].contains("140,000,000"));
        assert!(lines[1].trim_end().ends_with("0.285"));
    }

    #[test]
    fn summary_block() {
        let s = DatasetSummary {
            rows: 10,
            min_year: 1960,
            max_year: 2023,
            countries: 260,
            mean_birth_rate: 27.456,
        };
        let mut buf = Vec::new();
        write_dataset_summary(&mut buf, &s).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Years covered: 1960 - 2023"));
        assert!(text.contains("Number of countries: 260"));
        assert!(text.contains("27.46 per 1,000 people"));
        assert_eq!(fmt_count(f64::NAN), "NA");
    }
}
