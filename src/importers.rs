// ! Readers for raw USGS discharge files and the precomputed metrics tables

pub mod discharge_reader;
pub mod metrics_reader;

// Re-export commonly used items
pub use discharge_reader::{DischargeReadError, DischargeReader, DischargeRecord, DischargeSeries};
pub use metrics_reader::{MetricRow, MetricsReadError, MetricsReader, MetricsTable};
