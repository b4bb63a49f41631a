pub mod report_service;

pub use report_service::{ReportError, ReportInputs, ReportService, ReportSummary};
