use crate::error::LoadError;
use crate::model::Transaction;
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

const DATE_COL: &str = "Date";
const DESCRIPTION_COL: &str = "Description";
const UNITS_COL: &str = "Units Sold";
const REQUIRED_COLS: [&str; 3] = [DATE_COL, DESCRIPTION_COL, UNITS_COL];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Rows from every readable file plus one error per file that was skipped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub transactions: Vec<Transaction>,
    pub errors: Vec<(String, LoadError)>,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Loads each file in turn, appending its rows. A bad file is reported and skipped.
pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> LoadReport {
    let mut report = LoadReport::default();

    for path in paths {
        let path = path.as_ref();
        let name = path.display().to_string();

        match load_file(path) {
            Ok(rows) => {
                info!(file = %name, rows = rows.len(), "loaded sales file");
                report.transactions.extend(rows);
            }
            Err(e) => {
                warn!(file = %name, error = %e, "skipping sales file");
                report.errors.push((name, e));
            }
        }
    }

    report
}

pub fn load_file(path: &Path) -> Result<Vec<Transaction>, LoadError> {
    let file = File::open(path)?;
    load_reader(file)
}

/// One CSV row as written, before any coercion.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Units Sold")]
    units_sold: String,
    #[serde(rename = "Unit Price", default)]
    unit_price: Option<String>,
}

pub fn load_reader<R: Read>(reader: R) -> Result<Vec<Transaction>, LoadError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    for name in REQUIRED_COLS {
        column(&headers, name)?;
    }

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        let raw = result?;

        let Some(date) = parse_date(&raw.date) else {
            dropped += 1;
            continue;
        };

        let units_sold = parse_units(&raw.units_sold).ok_or_else(|| LoadError::InvalidFormat {
            row: idx + 1,
            message: format!("'{}' is not a non-negative number of units", raw.units_sold),
        })?;

        rows.push(Transaction {
            date,
            description: raw.description,
            unit_price: raw.unit_price.as_deref().map(normalize_price).unwrap_or(0.0),
            units_sold,
        });
    }

    if dropped > 0 {
        debug!(dropped, "rows dropped for unparseable dates");
    }

    Ok(rows)
}

fn column(headers: &StringRecord, name: &str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
}

/// Strips everything except digits and the decimal point, e.g. `"$12.50"` -> `12.5`.
/// Anything unparseable becomes zero.
pub fn normalize_price(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
}

// Blank cells sum as zero. NaN, infinities and negatives are rejected.
fn parse_units(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}
