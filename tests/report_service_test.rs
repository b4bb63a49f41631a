// End-to-end tests for ReportService using fixture files in a temp directory

use chrono::{Days, NaiveDate};
use discharge_report::charts::ALL_CHARTS;
use discharge_report::config::Config;
use discharge_report::services::{ReportError, ReportService};
use discharge_report::stations::STATION_REGISTRY;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ANNUAL: &str = "\
Date,Mean Flow,Peak Flow,Coeff Var,Tqmean,R-B Index,Station
2017-09-30,300,4000,180,0.26,0.31,Wildcat
2018-09-30,250,5000,170,0.24,0.29,Wildcat
2019-09-30,280,,160,0.25,0.30,Wildcat
2017-09-30,1500,9000,85,0.33,0.08,Tippe
2018-09-30,1400,7000,80,0.31,0.07,Tippe
2019-09-30,1450,8000,82,0.32,0.07,Tippe
";

const MONTHLY: &str = "\
Date,Mean Flow,Coeff Var,Tqmean,R-B Index,Station
2018-01-31,10,1,0.2,0.1,Wildcat
2019-01-31,20,1,0.2,0.1,Wildcat
2018-01-31,100,1,0.2,0.1,Tippe
2019-01-31,300,1,0.2,0.1,Tippe
";

fn rdb(site_no: &str, start: NaiveDate, days: u64) -> String {
    let mut text = String::from(
        "# USGS daily values\nagency_cd\tsite_no\tdatetime\tdischarge\tdischarge_cd\n5s\t15s\t20d\t14n\t10s\n",
    );
    for i in 0..days {
        let date = start + Days::new(i);
        let value = if i % 10 == 0 { "Eqp".to_string() } else { format!("{}", 100 + i) };
        writeln!(text, "USGS\t{site_no}\t{date}\t{value}\tA").unwrap();
    }
    text
}

fn write_inputs(dir: &Path) {
    let start = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
    for station in STATION_REGISTRY {
        fs::write(dir.join(station.raw_file), rdb(station.site_no, start, 3000)).unwrap();
    }
    fs::write(dir.join("Annual_Metrics.csv"), ANNUAL).unwrap();
    fs::write(dir.join("Monthly_Metrics.csv"), MONTHLY).unwrap();
}

fn config(data: &Path, out: &Path) -> Config {
    Config {
        data_dir: data.to_path_buf(),
        output_dir: out.to_path_buf(),
        ..Config::default()
    }
}

#[test]
fn test_load_inputs_clips_both_stations() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(data.path());

    let service = ReportService::new(config(data.path(), out.path()));
    let inputs = service.load_inputs().unwrap();

    assert_eq!(inputs.stations.len(), 2);
    for station in &inputs.stations {
        assert_eq!(station.full_len, 3000);
        assert_eq!(station.full_missing, 300);
        assert_eq!(
            station.clipped.last_date(),
            NaiveDate::from_ymd_opt(2019, 9, 30)
        );
        assert!(station.clipped.len() < station.full_len);
        assert_eq!(station.annual.len(), 3);
    }
}

#[test]
fn test_build_charts_from_files() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(data.path());

    let service = ReportService::new(Config {
        title_suffix: Some("Field".to_string()),
        ..config(data.path(), out.path())
    });
    let inputs = service.load_inputs().unwrap();
    let charts = service.build_charts(&inputs).unwrap();

    assert_eq!(charts.len(), ALL_CHARTS.len());
    let names: Vec<_> = charts.iter().map(|c| c.definition.file_name).collect();
    let expected: Vec<_> = ALL_CHARTS.iter().map(|c| c.file_name).collect();
    assert_eq!(names, expected);

    let exceedance = charts.last().unwrap();
    assert_eq!(exceedance.title, "Peak Flow Probability - Field");
    // Wildcat's 2019 peak is blank
    assert_eq!(exceedance.series[0].points.len(), 2);
    assert_eq!(exceedance.series[1].points.len(), 3);

    let monthly = &charts[4];
    assert_eq!(monthly.series[1].points[0], (1.0, Some(200.0)));
}

#[test]
fn test_station_missing_from_metrics_aborts() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(data.path());
    let wildcat_only: String = ANNUAL
        .lines()
        .filter(|l| !l.ends_with("Tippe"))
        .map(|l| format!("{l}\n"))
        .collect();
    fs::write(data.path().join("Annual_Metrics.csv"), wildcat_only).unwrap();

    let service = ReportService::new(config(data.path(), out.path()));
    match service.load_inputs() {
        Err(ReportError::StationNotFound { station, .. }) => assert_eq!(station, "Tippe"),
        other => panic!("Expected StationNotFound, got {other:?}"),
    }
}

#[test]
fn test_missing_raw_file_aborts() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(data.path());
    fs::remove_file(data.path().join(STATION_REGISTRY[1].raw_file)).unwrap();

    let service = ReportService::new(config(data.path(), out.path()));
    assert!(matches!(
        service.load_inputs(),
        Err(ReportError::Discharge(_))
    ));
}

#[test]
fn test_write_summary() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(data.path());

    let service = ReportService::new(config(data.path(), &out.path().join("report")));
    let inputs = service.load_inputs().unwrap();
    let summary = discharge_report::services::ReportSummary::new(service.config(), &inputs, &[]);
    let path = service.write_summary(&summary).unwrap();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["clip_end"], "2019-09-30");
    assert_eq!(json["stations"][1]["name"], "Tippecanoe River");
    assert_eq!(json["stations"][0]["annual_peaks_ranked"], 2);
}

#[test]
#[ignore] // needs a system sans-serif font for text rendering
fn test_run_writes_six_pngs() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(data.path());

    let service = ReportService::new(config(data.path(), out.path()));
    let mut seen = 0;
    let summary = service.run(|_| seen += 1).unwrap();

    assert_eq!(seen, 6);
    assert_eq!(summary.charts.len(), 6);
    for chart in ALL_CHARTS {
        let path = out.path().join(chart.file_name);
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n", "{} is not a PNG", path.display());
    }
}
