use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use discharge_report::charts::ALL_CHARTS;
use discharge_report::config::Config;
use discharge_report::services::ReportService;

#[derive(Parser, Debug)]
#[command(name = "discharge-report")]
#[command(about = "Render Wildcat Creek / Tippecanoe River discharge charts", long_about = None)]
struct Cli {
    /// Directory holding the raw discharge files and metrics CSVs
    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory the PNGs (and summary) are written to
    #[arg(long, env = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// First day kept from the raw files (YYYY-MM-DD)
    #[arg(long, env = "CLIP_START")]
    clip_start: Option<NaiveDate>,

    /// Last day kept from the raw files (YYYY-MM-DD)
    #[arg(long, env = "CLIP_END")]
    clip_end: Option<NaiveDate>,

    /// Text appended to every chart title (default "Field"; empty for none)
    #[arg(long, env = "TITLE_SUFFIX")]
    title_suffix: Option<String>,

    /// Also write report_summary.json to the output directory
    #[arg(long)]
    summary_json: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(date) = self.clip_start {
            config.clip_start = date;
        }
        if let Some(date) = self.clip_end {
            config.clip_end = date;
        }
        if let Some(suffix) = self.title_suffix {
            config.title_suffix = Some(suffix).filter(|s| !s.trim().is_empty());
        }
    }
}

#[instrument]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,discharge_report=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let write_summary = cli.summary_json;

    let config = Config::from_env_with(|config| cli.apply(config))?;
    info!("Starting discharge report with config: {:?}", config);

    let service = ReportService::new(config);

    let pb = ProgressBar::new(ALL_CHARTS.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let summary = service.run(|path| {
        pb.set_message(path.display().to_string());
        pb.inc(1);
    })?;
    pb.finish_with_message("done");

    for station in &summary.stations {
        info!(
            "{}: {} days clipped ({} missing), {} annual peaks ranked",
            station.name,
            station.clipped_records,
            station.clipped_missing,
            station.annual_peaks_ranked
        );
    }

    if write_summary {
        service.write_summary(&summary)?;
    }

    Ok(())
}
