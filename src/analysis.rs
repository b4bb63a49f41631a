pub mod exceedance;
pub mod monthly;

pub use exceedance::{exceedance_probabilities, ExceedanceSeries};
pub use monthly::{monthly_averages, MonthlyAverages, MONTHS};
