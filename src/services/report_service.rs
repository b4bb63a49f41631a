use chrono::{Months, NaiveDate};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::analysis::{exceedance_probabilities, monthly_averages};
use crate::charts::definitions::{
    ANNUAL_COEFF_VAR, ANNUAL_RB_INDEX, ANNUAL_TQMEAN, DAILY_DISCHARGE_5_YEAR,
    EXCEEDANCE_PROBABILITY, MONTHLY_MEAN_FLOW,
};
use crate::charts::{Chart, ChartDefinition, ChartError, ChartRenderer, ChartSeries};
use crate::config::Config;
use crate::importers::{
    DischargeReadError, DischargeReader, DischargeSeries, MetricsReadError, MetricsReader,
    MetricsTable,
};
use crate::stations::{find_station, Station, STATION_REGISTRY};

pub const SUMMARY_FILE: &str = "report_summary.json";

pub const COEFF_VAR: &str = "Coeff Var";
pub const TQMEAN: &str = "Tqmean";
pub const RB_INDEX: &str = "R-B Index";
pub const PEAK_FLOW: &str = "Peak Flow";
pub const MEAN_FLOW: &str = "Mean Flow";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Discharge read error: {0}")]
    Discharge(#[from] DischargeReadError),

    #[error("Metrics read error: {0}")]
    Metrics(#[from] MetricsReadError),

    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    #[error("Station '{station}' not found in {table}")]
    StationNotFound { station: String, table: String },

    #[error("Statistic '{0}' not found in metrics table")]
    MissingStatistic(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything loaded for one station
#[derive(Debug, Clone)]
pub struct StationData {
    pub station: &'static Station,
    pub full_len: usize,
    pub full_missing: usize,
    /// Daily discharge restricted to the configured clip window
    pub clipped: DischargeSeries,
    pub clipped_missing: usize,
    pub annual: MetricsTable,
    pub monthly: MetricsTable,
}

/// Inputs for every station, in registry (plot) order
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub stations: Vec<StationData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationSummary {
    pub abbreviation: String,
    pub name: String,
    pub site_no: String,
    pub full_records: usize,
    pub full_missing: usize,
    pub clipped_records: usize,
    pub clipped_missing: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub annual_peaks_ranked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub clip_start: NaiveDate,
    pub clip_end: NaiveDate,
    pub stations: Vec<StationSummary>,
    pub charts: Vec<String>,
}

impl ReportSummary {
    pub fn new(config: &Config, inputs: &ReportInputs, written: &[PathBuf]) -> Self {
        let stations = inputs
            .stations
            .iter()
            .map(|data| StationSummary {
                abbreviation: data.station.abbreviation.to_string(),
                name: data.station.name.to_string(),
                site_no: data.station.site_no.to_string(),
                full_records: data.full_len,
                full_missing: data.full_missing,
                clipped_records: data.clipped.len(),
                clipped_missing: data.clipped_missing,
                first_date: data.clipped.first_date(),
                last_date: data.clipped.last_date(),
                annual_peaks_ranked: present_peaks(&data.annual).map(|p| p.len()).unwrap_or(0),
            })
            .collect();

        let charts = written
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.display().to_string())
            })
            .collect();

        Self {
            clip_start: config.clip_start,
            clip_end: config.clip_end,
            stations,
            charts,
        }
    }
}

pub struct ReportService {
    config: Config,
    renderer: ChartRenderer,
}

impl ReportService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            renderer: ChartRenderer::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read both raw files and both metrics tables, clip the raw data and
    /// split the metrics by station
    #[instrument(skip(self))]
    pub fn load_inputs(&self) -> Result<ReportInputs, ReportError> {
        let annual_path = self.config.annual_metrics_path();
        let monthly_path = self.config.monthly_metrics_path();
        let annual = MetricsReader::new(&annual_path).read()?;
        let monthly = MetricsReader::new(&monthly_path).read()?;
        warn_unknown_stations(&annual, &annual_path);
        warn_unknown_stations(&monthly, &monthly_path);

        let mut stations = Vec::with_capacity(STATION_REGISTRY.len());
        for station in STATION_REGISTRY {
            let (full, full_missing) =
                DischargeReader::new(self.config.raw_path(station.raw_file)).read()?;
            let (clipped, clipped_missing) =
                full.clip(self.config.clip_start, self.config.clip_end);
            info!(
                "{}: {} of {} days inside {} to {} ({} missing)",
                station.name,
                clipped.len(),
                full.len(),
                self.config.clip_start,
                self.config.clip_end,
                clipped_missing
            );

            stations.push(StationData {
                station,
                full_len: full.len(),
                full_missing,
                clipped,
                clipped_missing,
                annual: station_rows(&annual, station, &annual_path)?,
                monthly: station_rows(&monthly, station, &monthly_path)?,
            });
        }

        Ok(ReportInputs { stations })
    }

    /// Assemble all six charts from loaded inputs
    #[instrument(skip(self, inputs))]
    pub fn build_charts(&self, inputs: &ReportInputs) -> Result<Vec<Chart>, ReportError> {
        let suffix = self.config.title_suffix.as_deref();

        let charts = vec![
            Chart::new(DAILY_DISCHARGE_5_YEAR, suffix, self.daily_series(inputs)?),
            self.annual_chart(ANNUAL_COEFF_VAR, COEFF_VAR, inputs)?,
            self.annual_chart(ANNUAL_TQMEAN, TQMEAN, inputs)?,
            self.annual_chart(ANNUAL_RB_INDEX, RB_INDEX, inputs)?,
            Chart::new(MONTHLY_MEAN_FLOW, suffix, monthly_series(inputs)?),
            Chart::new(EXCEEDANCE_PROBABILITY, suffix, exceedance_series(inputs)?),
        ];

        debug!("Built {} charts", charts.len());
        Ok(charts)
    }

    /// Render charts in order, stopping at the first failure. Files
    /// already written stay on disk.
    pub fn render_charts<F>(
        &self,
        charts: &[Chart],
        mut on_written: F,
    ) -> Result<Vec<PathBuf>, ReportError>
    where
        F: FnMut(&Path),
    {
        fs::create_dir_all(&self.config.output_dir)?;

        let mut written = Vec::with_capacity(charts.len());
        for chart in charts {
            let path = self.renderer.render(chart, &self.config.output_dir)?;
            on_written(&path);
            written.push(path);
        }
        Ok(written)
    }

    /// Load, build and render everything
    #[instrument(skip(self, on_written))]
    pub fn run<F>(&self, on_written: F) -> Result<ReportSummary, ReportError>
    where
        F: FnMut(&Path),
    {
        let inputs = self.load_inputs()?;
        let charts = self.build_charts(&inputs)?;
        let written = self.render_charts(&charts, on_written)?;
        info!("Wrote {} charts to {}", written.len(), self.config.output_dir.display());
        Ok(ReportSummary::new(&self.config, &inputs, &written))
    }

    pub fn write_summary(&self, summary: &ReportSummary) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.config.output_dir)?;
        let path = self.config.output_dir.join(SUMMARY_FILE);
        fs::write(&path, serde_json::to_string_pretty(summary)?)?;
        info!("Wrote run summary to {}", path.display());
        Ok(path)
    }

    /// Daily discharge over the trailing window ending at the first
    /// station's last clipped date, applied to every station
    fn daily_series(&self, inputs: &ReportInputs) -> Result<Vec<ChartSeries>, ReportError> {
        let first = inputs
            .stations
            .first()
            .ok_or_else(|| ReportError::NoData("no stations loaded".to_string()))?;
        let end = first.clipped.last_date().ok_or_else(|| {
            ReportError::NoData(format!(
                "{} has no daily values inside the clip window",
                first.station.name
            ))
        })?;
        let start = end
            .checked_sub_months(Months::new(self.config.daily_window_months))
            .unwrap_or(NaiveDate::MIN);
        debug!("Daily window {} to {}", start, end);

        Ok(inputs
            .stations
            .iter()
            .map(|data| {
                let (window, _) = data.clipped.clip(start, end);
                ChartSeries::from_dated(data.station.name, &window.discharge())
            })
            .collect())
    }

    fn annual_chart(
        &self,
        definition: ChartDefinition,
        statistic: &str,
        inputs: &ReportInputs,
    ) -> Result<Chart, ReportError> {
        let series = inputs
            .stations
            .iter()
            .map(|data| {
                let values = data
                    .annual
                    .column(statistic)
                    .ok_or_else(|| ReportError::MissingStatistic(statistic.to_string()))?;
                Ok(ChartSeries::from_dated(data.station.name, &values))
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        Ok(Chart::new(
            definition,
            self.config.title_suffix.as_deref(),
            series,
        ))
    }
}

fn station_rows(
    table: &MetricsTable,
    station: &Station,
    path: &Path,
) -> Result<MetricsTable, ReportError> {
    let rows = table.for_station(station.abbreviation);
    if rows.is_empty() {
        return Err(ReportError::StationNotFound {
            station: station.abbreviation.to_string(),
            table: path.display().to_string(),
        });
    }
    Ok(rows)
}

/// Rows for stations outside the registry are read but never plotted
fn warn_unknown_stations(table: &MetricsTable, path: &Path) -> Vec<String> {
    let unknown: Vec<String> = table
        .stations()
        .into_iter()
        .filter(|abbreviation| find_station(abbreviation).is_none())
        .map(String::from)
        .collect();
    if !unknown.is_empty() {
        warn!(
            "{} has rows for stations not in the registry: {:?}",
            path.display(),
            unknown
        );
    }
    unknown
}

fn monthly_series(inputs: &ReportInputs) -> Result<Vec<ChartSeries>, ReportError> {
    inputs
        .stations
        .iter()
        .map(|data| {
            let averages = monthly_averages(&data.monthly);
            let values = averages
                .series(MEAN_FLOW)
                .ok_or_else(|| ReportError::MissingStatistic(MEAN_FLOW.to_string()))?;
            Ok(ChartSeries::from_monthly(data.station.name, &values))
        })
        .collect()
}

fn exceedance_series(inputs: &ReportInputs) -> Result<Vec<ChartSeries>, ReportError> {
    inputs
        .stations
        .iter()
        .map(|data| {
            let peaks = present_peaks(&data.annual)?;
            let ranked = exceedance_probabilities(&peaks);
            Ok(ChartSeries::from_exceedance(data.station.name, &ranked.points()))
        })
        .collect()
}

/// Annual peak flows with missing years dropped
fn present_peaks(annual: &MetricsTable) -> Result<Vec<f64>, ReportError> {
    let column = annual
        .column(PEAK_FLOW)
        .ok_or_else(|| ReportError::MissingStatistic(PEAK_FLOW.to_string()))?;
    let total = column.len();
    let peaks: Vec<f64> = column.into_iter().filter_map(|(_, v)| v).collect();
    if peaks.len() < total {
        warn!("Dropped {} missing annual peaks before ranking", total - peaks.len());
    }
    Ok(peaks)
}
