//! Annual / Monthly Metrics Reader
//!
//! Reads the statistics tables produced by the descriptive-statistics step
//! (`Annual_Metrics.csv`, `Monthly_Metrics.csv`). Both share one layout: a
//! `Date` column, a `Station` abbreviation column, and any number of numeric
//! statistic columns (`Mean Flow`, `Peak Flow`, `Coeff Var`, `Tqmean`,
//! `R-B Index`, ...).
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::utils::is_missing_marker;

pub const DATE_COLUMN: &str = "Date";
pub const STATION_COLUMN: &str = "Station";

#[derive(Error, Debug)]
pub enum MetricsReadError {
    #[error("Failed to open {path}: {source}")]
    FileOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Invalid date at line {line}: {value}")]
    InvalidDate { line: usize, value: String },

    #[error("Invalid value at line {line}, column '{column}': {value}")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },
}

/// One row of a metrics table
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub date: NaiveDate,
    pub station: String,
    /// One entry per statistic, in `MetricsTable::statistics` order
    pub values: Vec<Option<f64>>,
}

/// Date-indexed statistics for one or more stations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsTable {
    statistics: Vec<String>,
    rows: Vec<MetricRow>,
}

impl MetricsTable {
    pub fn new(statistics: Vec<String>, rows: Vec<MetricRow>) -> Self {
        Self { statistics, rows }
    }

    /// Statistic column names, in file order
    pub fn statistics(&self) -> &[String] {
        &self.statistics
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn statistic_index(&self, name: &str) -> Option<usize> {
        self.statistics.iter().position(|s| s == name)
    }

    /// Distinct station abbreviations in order of first appearance
    pub fn stations(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.station.as_str()) {
                seen.push(&row.station);
            }
        }
        seen
    }

    /// Rows whose `Station` column equals `abbreviation` exactly
    pub fn for_station(&self, abbreviation: &str) -> MetricsTable {
        let rows = self
            .rows
            .iter()
            .filter(|r| r.station == abbreviation)
            .cloned()
            .collect();
        MetricsTable::new(self.statistics.clone(), rows)
    }

    /// One statistic as a date-keyed series. `None` if there is no such column.
    pub fn column(&self, name: &str) -> Option<Vec<(NaiveDate, Option<f64>)>> {
        let idx = self.statistic_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| (r.date, r.values.get(idx).copied().flatten()))
                .collect(),
        )
    }
}

/// Reader for a metrics CSV file
pub struct MetricsReader {
    path: PathBuf,
}

impl MetricsReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> Result<MetricsTable, MetricsReadError> {
        info!("Reading metrics file: {}", self.path.display());

        let file = File::open(&self.path).map_err(|source| MetricsReadError::FileOpen {
            path: self.path.display().to_string(),
            source,
        })?;
        let table = parse_metrics(file)?;

        info!(
            "Read {} rows x {} statistics for stations {:?} from {}",
            table.len(),
            table.statistics().len(),
            table.stations(),
            self.path.display()
        );
        Ok(table)
    }
}

/// Parse metrics CSV content from any reader
pub fn parse_metrics<R: Read>(input: R) -> Result<MetricsTable, MetricsReadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();

    let date_idx = headers
        .iter()
        .position(|h| h == DATE_COLUMN)
        .ok_or(MetricsReadError::MissingColumn(DATE_COLUMN))?;
    let station_idx = headers
        .iter()
        .position(|h| h == STATION_COLUMN)
        .ok_or(MetricsReadError::MissingColumn(STATION_COLUMN))?;

    // (column index, name) for every statistic column
    let statistic_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_idx && *i != station_idx)
        .map(|(i, h)| (i, h.clone()))
        .collect();
    debug!("Statistic columns: {:?}", statistic_columns);

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = idx + 2;

        let date_str = record.get(date_idx).unwrap_or("");
        let date = parse_metric_date(date_str).ok_or_else(|| MetricsReadError::InvalidDate {
            line,
            value: date_str.to_string(),
        })?;

        let station = record.get(station_idx).unwrap_or("").to_string();

        let mut values = Vec::with_capacity(statistic_columns.len());
        for (col_idx, name) in &statistic_columns {
            let raw = record.get(*col_idx).unwrap_or("");
            let value = if is_missing_marker(raw) {
                None
            } else {
                Some(
                    raw.parse::<f64>()
                        .map_err(|_| MetricsReadError::InvalidNumber {
                            line,
                            column: name.clone(),
                            value: raw.to_string(),
                        })?,
                )
            };
            values.push(value.filter(|v| !v.is_nan()));
        }

        rows.push(MetricRow {
            date,
            station,
            values,
        });
    }

    let statistics = statistic_columns.into_iter().map(|(_, name)| name).collect();
    Ok(MetricsTable::new(statistics, rows))
}

/// Dates are written either as `YYYY-MM-DD` or with a midnight timestamp
fn parse_metric_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
