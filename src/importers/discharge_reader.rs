//! USGS Daily Discharge Reader
//!
//! Parses daily-value RDB exports from USGS NWIS. The files look like:
//! ```text
//! # comment lines describing the site and parameters
//! agency_cd  site_no   datetime    149162_00060_00003  149162_00060_00003_cd
//! 5s         15s       20d         14n                 10s
//! USGS       03335000  1954-06-01  250                 A
//! USGS       03335000  1954-06-02  Eqp
//! ```
//! The column header row is skipped (names are fixed), as is the RDB column
//! format row when present.
use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::utils::{is_missing_marker, parse_discharge_file_name};

#[derive(Error, Debug)]
pub enum DischargeReadError {
    #[error("Failed to open {path}: {source}")]
    FileOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("Missing header row")]
    MissingHeader,

    #[error("Invalid data at line {line}: {msg}")]
    InvalidData { line: usize, msg: String },

    #[error("Invalid date at line {line}: {value}")]
    InvalidDate { line: usize, value: String },

    #[error("Dates out of order at line {line}: {date} does not follow {previous}")]
    OutOfOrder {
        line: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },
}

/// One daily value from a raw discharge file
#[derive(Debug, Clone, PartialEq)]
pub struct DischargeRecord {
    pub agency_cd: String,
    pub site_no: String,
    pub date: NaiveDate,
    /// Mean daily discharge in ft^3/s. `None` for sentinel values and
    /// negative readings.
    pub discharge: Option<f64>,
    /// USGS approval code ("A" approved, "P" provisional, ...)
    pub quality: Option<String>,
}

/// Date-indexed daily discharge for one station
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DischargeSeries {
    records: Vec<DischargeRecord>,
}

impl DischargeSeries {
    pub fn new(records: Vec<DischargeRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[DischargeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Number of days with no usable discharge value
    pub fn missing_count(&self) -> usize {
        self.records.iter().filter(|r| r.discharge.is_none()).count()
    }

    /// Restrict to the inclusive window `[start, end]`.
    ///
    /// Returns the clipped series and its missing-value count. A window with
    /// `start > end`, or one that misses every record, yields an empty series
    /// and a count of zero.
    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> (DischargeSeries, usize) {
        if start > end {
            warn!("Clip window start {} is after end {}", start, end);
            return (DischargeSeries::default(), 0);
        }

        let records: Vec<DischargeRecord> = self
            .records
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect();

        if records.is_empty() {
            warn!("Clip window {} to {} contains no records", start, end);
        }

        let clipped = DischargeSeries::new(records);
        let missing = clipped.missing_count();
        debug!(
            "Clipped to {} to {}: {} records, {} missing",
            start,
            end,
            clipped.len(),
            missing
        );
        (clipped, missing)
    }

    /// The discharge column alone, keyed by date
    pub fn discharge(&self) -> Vec<(NaiveDate, Option<f64>)> {
        self.records.iter().map(|r| (r.date, r.discharge)).collect()
    }
}

/// Reader for a single raw discharge file
pub struct DischargeReader {
    path: PathBuf,
}

impl DischargeReader {
    /// Create a new reader
    ///
    /// # Arguments
    /// * `path` - Path to the RDB file (e.g., "WildcatCreek_Discharge_03335000_19540601-20200315.txt")
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the whole file
    ///
    /// Returns the series and the number of missing values across the full
    /// span of the file.
    pub fn read(&self) -> Result<(DischargeSeries, usize), DischargeReadError> {
        info!("Reading discharge file: {}", self.path.display());

        let contents =
            fs::read_to_string(&self.path).map_err(|source| DischargeReadError::FileOpen {
                path: self.path.display().to_string(),
                source,
            })?;

        let series = parse_discharge_text(&contents)?;
        self.check_against_file_name(&series);

        let missing = series.missing_count();
        info!(
            "Read {} daily values ({} missing) from {}",
            series.len(),
            missing,
            self.path.display()
        );

        Ok((series, missing))
    }

    /// Warn when the contents disagree with what the file name declares
    fn check_against_file_name(&self, series: &DischargeSeries) {
        let declared = match self.path.to_str().map(parse_discharge_file_name) {
            Some(Ok(name)) => name,
            Some(Err(e)) => {
                debug!("Not checking {} against its name: {}", self.path.display(), e);
                return;
            }
            None => return,
        };

        if let Some(record) = series
            .records()
            .iter()
            .find(|r| r.site_no != declared.site_no)
        {
            warn!(
                "File name declares site {} but {} contains site {}",
                declared.site_no,
                self.path.display(),
                record.site_no
            );
        }

        if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
            if first != declared.period_start || last != declared.period_end {
                warn!(
                    "File name declares {} to {} but data covers {} to {}",
                    declared.period_start, declared.period_end, first, last
                );
            }
        }
    }
}

/// Parse the text of an RDB daily-value file
///
/// Line numbers in errors are 1-based positions in `text`.
pub fn parse_discharge_text(text: &str) -> Result<DischargeSeries, DischargeReadError> {
    let mut records: Vec<DischargeRecord> = Vec::new();
    let mut header_seen = false;
    let mut format_row_checked = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;

        let content = strip_comment(raw);
        if content.is_empty() {
            continue;
        }

        if !header_seen {
            debug!("Skipping header row at line {}", line_no);
            header_seen = true;
            continue;
        }

        if !format_row_checked {
            format_row_checked = true;
            if is_rdb_format_row(&content) {
                debug!("Skipping RDB format row at line {}", line_no);
                continue;
            }
        }

        let record = parse_record(line_no, &content)?;

        if let Some(previous) = records.last() {
            if record.date <= previous.date {
                return Err(DischargeReadError::OutOfOrder {
                    line: line_no,
                    date: record.date,
                    previous: previous.date,
                });
            }
        }

        records.push(record);
    }

    if !header_seen {
        return Err(DischargeReadError::MissingHeader);
    }

    Ok(DischargeSeries::new(records))
}

/// Drop comment text. A line whose first non-blank character is `#` is a
/// comment; otherwise the comment starts at the first `#` token that is not
/// a missing-value marker such as `#N/A`.
fn strip_comment(raw: &str) -> String {
    if raw.trim_start().starts_with('#') {
        return String::new();
    }
    raw.split_whitespace()
        .take_while(|token| !token.starts_with('#') || is_missing_marker(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// RDB files follow the header with a row of column widths/types ("5s 15s 20d 14n 10s")
fn is_rdb_format_row(content: &str) -> bool {
    let re = match Regex::new(r"^\d+[sdnSDN]$") {
        Ok(re) => re,
        Err(_) => return false,
    };
    content.split_whitespace().all(|token| re.is_match(token))
}

fn parse_record(line_no: usize, content: &str) -> Result<DischargeRecord, DischargeReadError> {
    let tokens: Vec<&str> = content.split_whitespace().collect();

    // The quality code is blank on some equipment-down days
    if !(4..=5).contains(&tokens.len()) {
        return Err(DischargeReadError::InvalidData {
            line: line_no,
            msg: format!(
                "expected agency_cd, site_no, date, discharge, quality; found {} columns",
                tokens.len()
            ),
        });
    }

    let date = NaiveDate::parse_from_str(tokens[2], "%Y-%m-%d").map_err(|_| {
        DischargeReadError::InvalidDate {
            line: line_no,
            value: tokens[2].to_string(),
        }
    })?;

    let discharge = parse_discharge(line_no, tokens[3])?;

    let quality = tokens
        .get(4)
        .filter(|q| !is_missing_marker(q))
        .map(|q| q.to_string());

    Ok(DischargeRecord {
        agency_cd: tokens[0].to_string(),
        site_no: tokens[1].to_string(),
        date,
        discharge,
        quality,
    })
}

fn parse_discharge(line_no: usize, token: &str) -> Result<Option<f64>, DischargeReadError> {
    if is_missing_marker(token) {
        return Ok(None);
    }

    let value = token
        .parse::<f64>()
        .map_err(|_| DischargeReadError::InvalidData {
            line: line_no,
            msg: format!("Cannot parse discharge value: {token}"),
        })?;

    // Gross error check: negative flow is recorded as missing, not zero
    if value.is_nan() || value < 0.0 {
        debug!("Treating discharge {} at line {} as missing", token, line_no);
        return Ok(None);
    }

    Ok(Some(value))
}
