//! Chart definitions and PNG rendering

pub mod definitions;
pub mod renderer;

pub use definitions::{Chart, ChartDefinition, ChartSeries, ALL_CHARTS};
pub use renderer::{ChartError, ChartRenderer};
