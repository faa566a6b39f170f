//! Persistence: the estimated birth table in a single-file SQLite database, the fixed
//! yearly aggregation query over it, and CSV/JSON export of the yearly summary.

use crate::error::{PipelineError, Result};
use crate::models::{CANADA_ISO3, EstimatedRecord, YearlySummary};
use csv::WriterBuilder;
use log::debug;
use rusqlite::{Connection, params};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// True for plain SQL identifiers (`[A-Za-z_][A-Za-z0-9_]*`); table names are spliced into DDL.
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn checked_table(table: &str) -> Result<&str> {
    if is_sql_identifier(table) {
        Ok(table)
    } else {
        Err(PipelineError::config(format!(
            "table name {table:?} is not a plain SQL identifier"
        )))
    }
}

/// Open (or create) the database file.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Ok(Connection::open(path)?)
}

/// Replace `table` with exactly `rows`. Runs in one transaction, so a failed write leaves the
/// previous table in place.
pub fn write_estimates(
    conn: &mut Connection,
    table: &str,
    rows: &[EstimatedRecord],
) -> Result<usize> {
    let table = checked_table(table)?;
    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
             country_code     TEXT    NOT NULL,
             year             INTEGER NOT NULL,
             birth_rate       REAL    NOT NULL,
             population       REAL    NOT NULL,
             number_of_births REAL    NOT NULL
         );"
    ))?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (country_code, year, birth_rate, population, number_of_births)
             VALUES (?1, ?2, ?3, ?4, ?5)"
        ))?;
        for r in rows {
            stmt.execute(params![
                r.country_code,
                r.year,
                r.birth_rate,
                r.population,
                r.number_of_births
            ])?;
        }
    }
    tx.commit()?;
    debug!("wrote {} rows to table {table}", rows.len());
    Ok(rows.len())
}

/// Read the whole table back in insertion order.
pub fn read_estimates(conn: &Connection, table: &str) -> Result<Vec<EstimatedRecord>> {
    let table = checked_table(table)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT country_code, year, birth_rate, population, number_of_births
         FROM {table} ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(EstimatedRecord {
            country_code: row.get(0)?,
            year: row.get(1)?,
            birth_rate: row.get(2)?,
            population: row.get(3)?,
            number_of_births: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// The yearly share of Canadian births, computed in SQL, newest year first.
///
/// The percentage is taken from the unrounded sums. Years whose total is zero are excluded
/// by the `HAVING` clause, matching [`crate::aggregate::aggregate`].
pub fn query_yearly_summary(conn: &Connection, table: &str) -> Result<Vec<YearlySummary>> {
    let table = checked_table(table)?;
    let sql = format!(
        "SELECT
             year,
             ROUND(SUM(CASE WHEN country_code = ?1 THEN number_of_births ELSE 0 END), 0) AS canada_births,
             ROUND(SUM(number_of_births), 0) AS total_births,
             ROUND(
                 100.0 * SUM(CASE WHEN country_code = ?1 THEN number_of_births ELSE 0 END)
                     / SUM(number_of_births),
                 3
             ) AS chance_percent
         FROM {table}
         GROUP BY year
         HAVING SUM(number_of_births) <> 0
         ORDER BY year DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![CANADA_ISO3], |row| {
        Ok(YearlySummary {
            year: row.get(0)?,
            canada_births: row.get(1)?,
            total_births: row.get(2)?,
            chance_percent: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Save the yearly summary as CSV with header.
pub fn save_summary_csv<P: AsRef<Path>>(rows: &[YearlySummary], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize(("year", "canada_births", "total_births", "chance_percent"))?;
    for r in rows {
        wtr.serialize((r.year, r.canada_births, r.total_births, r.chance_percent))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the yearly summary as a pretty JSON array.
pub fn save_summary_json<P: AsRef<Path>>(rows: &[YearlySummary], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Save the yearly summary, choosing CSV or JSON from the file extension.
pub fn save_summary<P: AsRef<Path>>(rows: &[YearlySummary], path: P) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => save_summary_csv(rows, path),
        "json" => save_summary_json(rows, path),
        other => Err(PipelineError::config(format!(
            "unsupported export format: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn identifiers() {
        assert!(is_sql_identifier("birth_data"));
        assert!(is_sql_identifier("_t1"));
        assert!(!is_sql_identifier("1t"));
        assert!(!is_sql_identifier("birth data"));
        assert!(!is_sql_identifier("x; DROP TABLE y"));
        assert!(!is_sql_identifier(""));
    }

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let rows = vec![YearlySummary {
            year: 2020,
            canada_births: 399_000.0,
            total_births: 140_000_000.0,
            chance_percent: 0.285,
        }];
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        save_summary(&rows, &csvp).unwrap();
        save_summary(&rows, &jsonp).unwrap();
        assert!(std::fs::read_to_string(&csvp)
            .unwrap()
            .starts_with("year,canada_births,total_births,chance_percent"));
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&jsonp).unwrap()).unwrap();
        assert_eq!(v[0]["year"], 2020);
        assert!(save_summary(&rows, dir.path().join("x.xlsx")).is_err());
    }
}
