//! Across-year monthly averages of the monthly metrics table.
use chrono::Datelike;
use serde::Serialize;
use tracing::debug;

use crate::importers::metrics_reader::MetricsTable;

/// Calendar month numbers, in column order
pub const MONTHS: [u32; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

/// One row per statistic, one column per calendar month (1..=12)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAverages {
    statistics: Vec<String>,
    cells: Vec<[Option<f64>; 12]>,
}

impl MonthlyAverages {
    /// Column labels, always 1 through 12
    pub fn months(&self) -> [u32; 12] {
        MONTHS
    }

    pub fn statistics(&self) -> &[String] {
        &self.statistics
    }

    /// The 12 monthly means for one statistic
    pub fn row(&self, statistic: &str) -> Option<&[Option<f64>; 12]> {
        let idx = self.statistics.iter().position(|s| s == statistic)?;
        self.cells.get(idx)
    }

    pub fn get(&self, statistic: &str, month: u32) -> Option<f64> {
        if !(1..=12).contains(&month) {
            return None;
        }
        self.row(statistic)
            .and_then(|row| row[(month - 1) as usize])
    }

    /// Transposed view of one statistic: (month number, mean)
    pub fn series(&self, statistic: &str) -> Option<Vec<(u32, Option<f64>)>> {
        self.row(statistic)
            .map(|row| MONTHS.iter().copied().zip(row.iter().copied()).collect())
    }
}

/// Mean of every statistic for each calendar month, across all years.
///
/// Rows are bucketed by the month of their date, ignoring the year. Missing
/// values are left out of the mean; a bucket with no values for a statistic
/// yields `None` for that cell.
pub fn monthly_averages(table: &MetricsTable) -> MonthlyAverages {
    let statistics = table.statistics().to_vec();
    let mut cells = vec![[None; 12]; statistics.len()];

    for month in MONTHS {
        let bucket: Vec<_> = table
            .rows()
            .iter()
            .filter(|r| r.date.month() == month)
            .collect();
        debug!("Month {}: {} rows", month, bucket.len());

        for (stat_idx, row_cells) in cells.iter_mut().enumerate() {
            let (sum, count) = bucket
                .iter()
                .filter_map(|r| r.values.get(stat_idx).copied().flatten())
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

            row_cells[(month - 1) as usize] = if count > 0 {
                Some(sum / count as f64)
            } else {
                None
            };
        }
    }

    MonthlyAverages { statistics, cells }
}
