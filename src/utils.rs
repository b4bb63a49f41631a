//! Shared utility functions for the discharge report

use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;

/// Components of a raw discharge file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DischargeFileName {
    pub river: String,
    pub site_no: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// Parse the naming convention used for raw USGS discharge downloads:
/// `<River>_Discharge_<site_no>_<YYYYMMDD>-<YYYYMMDD>.txt`
///
/// Only the final path component is inspected, so a full path may be passed.
/// The declared period is what the file claims to cover; the reader compares it
/// against the dates it actually finds.
///
/// # Examples
///
/// ```
/// use discharge_report::utils::parse_discharge_file_name;
///
/// let name =
///     parse_discharge_file_name("data/WildcatCreek_Discharge_03335000_19540601-20200315.txt")
///         .unwrap();
/// assert_eq!(name.river, "WildcatCreek");
/// assert_eq!(name.site_no, "03335000");
/// assert_eq!(name.period_start.to_string(), "1954-06-01");
/// assert_eq!(name.period_end.to_string(), "2020-03-15");
/// ```
pub fn parse_discharge_file_name(value: &str) -> Result<DischargeFileName, &'static str> {
    let file_name = Path::new(value)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("Path has no file name")?;

    let re = Regex::new(r"^([A-Za-z]+)_Discharge_(\d{8,15})_(\d{8})-(\d{8})\.txt$")
        .map_err(|_| "Invalid file name pattern")?;
    let caps = re
        .captures(file_name)
        .ok_or("File name does not follow <River>_Discharge_<site>_<start>-<end>.txt")?;

    let period_start = NaiveDate::parse_from_str(&caps[3], "%Y%m%d")
        .map_err(|_| "Invalid period start date in file name")?;
    let period_end = NaiveDate::parse_from_str(&caps[4], "%Y%m%d")
        .map_err(|_| "Invalid period end date in file name")?;

    if period_start > period_end {
        return Err("Period start is after period end in file name");
    }

    Ok(DischargeFileName {
        river: caps[1].to_string(),
        site_no: caps[2].to_string(),
        period_start,
        period_end,
    })
}

/// Returns true if `token` is one of the markers USGS exports and spreadsheet
/// tools use for "no value".
///
/// `Eqp` is the USGS flag for an equipment malfunction period.
pub fn is_missing_marker(token: &str) -> bool {
    matches!(
        token.trim(),
        "" | "Eqp"
            | "NA"
            | "N/A"
            | "n/a"
            | "NaN"
            | "nan"
            | "-NaN"
            | "-nan"
            | "null"
            | "NULL"
            | "#N/A"
            | "<NA>"
    )
}
