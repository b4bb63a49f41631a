//! Peak-flow exceedance probability (Weibull plotting positions).
use serde::Serialize;

/// Peak flows sorted largest first, paired with their plotting positions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExceedanceSeries {
    /// p_i = i / n for rank i (1-indexed), strictly increasing
    pub probabilities: Vec<f64>,
    /// Peak flows in descending order
    pub values: Vec<f64>,
}

impl ExceedanceSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// (probability, value) pairs for plotting
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.probabilities
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }
}

/// Rank peak flows and assign exceedance probabilities.
///
/// Values are sorted descending (stable, so ties keep input order) and the
/// value at rank i of n gets probability i / n: the largest peak is 1/n and
/// the smallest is 1.0. Missing peaks must be dropped before calling.
pub fn exceedance_probabilities(peaks: &[f64]) -> ExceedanceSeries {
    let mut values = peaks.to_vec();
    values.sort_by(|a, b| b.total_cmp(a));

    let n = values.len() as f64;
    let probabilities = (1..=values.len()).map(|rank| rank as f64 / n).collect();

    ExceedanceSeries {
        probabilities,
        values,
    }
}
