// Tests for DischargeReader against RDB files written to disk

use chrono::NaiveDate;
use discharge_report::importers::discharge_reader::{DischargeReadError, DischargeReader};
use std::fs;
use tempfile::TempDir;

const WILDCAT_RDB: &str = "\
# ---------------------------------- WARNING ----------------------------------------
# Some of the data that you have obtained from this U.S. Geological Survey database
# may not have received Director's approval.
#
# Data for the following 1 site(s) are contained in this file
#    USGS 03335000 WILDCAT CREEK NEAR LAFAYETTE, IN
#
agency_cd\tsite_no\tdatetime\t149162_00060_00003\t149162_00060_00003_cd
5s\t15s\t20d\t14n\t10s
USGS\t03335000\t1969-09-30\t41.0\tA
USGS\t03335000\t1969-10-01\t40.0\tA
USGS\t03335000\t1969-10-02\t-5\tA
USGS\t03335000\t1969-10-03\tEqp
USGS\t03335000\t1969-10-04\t38.5\tA
";

const WILDCAT_FILE: &str = "WildcatCreek_Discharge_03335000_19690930-19691004.txt";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_read_counts_negative_and_sentinel_values_as_missing() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, WILDCAT_FILE, WILDCAT_RDB);

    let (series, missing) = DischargeReader::new(&path).read().unwrap();

    assert_eq!(series.len(), 5);
    assert_eq!(missing, 2);
    assert_eq!(series.records()[2].date, date(1969, 10, 2));
    assert_eq!(series.records()[2].discharge, None);
    assert_eq!(series.records()[3].discharge, None);
    assert_eq!(series.records()[3].quality, None);
    assert_eq!(series.records()[4].discharge, Some(38.5));
}

#[test]
fn test_clip_to_own_bounds_reproduces_table() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, WILDCAT_FILE, WILDCAT_RDB);

    let (series, missing) = DischargeReader::new(&path).read().unwrap();
    let (clipped, clipped_missing) =
        series.clip(series.first_date().unwrap(), series.last_date().unwrap());

    assert_eq!(clipped, series);
    assert_eq!(clipped_missing, missing);
}

#[test]
fn test_clip_to_water_year_start() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "wildcat.txt", WILDCAT_RDB);

    let (series, _) = DischargeReader::new(&path).read().unwrap();
    let (clipped, missing) = series.clip(date(1969, 10, 1), date(2019, 9, 30));

    assert_eq!(clipped.len(), 4);
    assert_eq!(clipped.first_date(), Some(date(1969, 10, 1)));
    assert_eq!(missing, 2);
    assert!(clipped
        .records()
        .iter()
        .all(|r| r.date >= date(1969, 10, 1) && r.date <= date(2019, 9, 30)));
}

#[test]
fn test_missing_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let result = DischargeReader::new(dir.path().join("nope.txt")).read();

    match result {
        Err(DischargeReadError::FileOpen { path, .. }) => assert!(path.ends_with("nope.txt")),
        other => panic!("Expected FileOpen error, got {other:?}"),
    }
}

#[test]
fn test_bad_row_aborts_the_read() {
    let dir = TempDir::new().unwrap();
    let contents = format!("{WILDCAT_RDB}USGS\t03335000\t1969-10-05\tlots\tA\n");
    let path = write_fixture(&dir, "wildcat.txt", &contents);

    let result = DischargeReader::new(&path).read();
    assert!(matches!(result, Err(DischargeReadError::InvalidData { .. })));
}
