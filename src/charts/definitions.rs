//! The six presentation charts: file names, titles, axis text, and the
//! x-axis conventions used to turn dates, months and probabilities into plot
//! coordinates.
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// How x values are produced and labelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum XAxis {
    /// Dates plotted as decimal years
    Date,
    /// Month numbers 1..=12
    Month,
    /// Exceedance probability, drawn from 1 on the left to 0 on the right
    ExceedanceProbability,
}

impl XAxis {
    /// Plot coordinate for an exceedance probability.
    ///
    /// The axis runs 1 → 0, so the coordinate is mirrored and
    /// [`XAxis::format_tick`] mirrors it back for the label.
    pub fn probability_to_x(p: f64) -> f64 {
        1.0 - p
    }

    pub fn format_tick(&self, x: f64) -> String {
        match self {
            XAxis::Date | XAxis::Month => format!("{:.0}", x),
            XAxis::ExceedanceProbability => format!("{:.1}", 1.0 - x),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartStyle {
    /// Connected line, broken at missing values
    Line,
    /// Unconnected markers
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LegendCorner {
    UpperLeft,
    UpperRight,
}

/// Fixed text and layout for one output image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartDefinition {
    pub file_name: &'static str,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub x_axis: XAxis,
    pub style: ChartStyle,
    pub legend: LegendCorner,
}

pub const DAILY_DISCHARGE_5_YEAR: ChartDefinition = ChartDefinition {
    file_name: "DailyDischarge5Year.png",
    title: "Last Five Years of Daily Discharge",
    x_label: "Date",
    y_label: "Discharge (ft^3/s)",
    x_axis: XAxis::Date,
    style: ChartStyle::Line,
    legend: LegendCorner::UpperRight,
};

pub const ANNUAL_COEFF_VAR: ChartDefinition = ChartDefinition {
    file_name: "AnnualCoeffVar.png",
    title: "Annual Coefficient of Variation",
    x_label: "Year",
    y_label: "Coefficient of Variation (%)",
    x_axis: XAxis::Date,
    style: ChartStyle::Line,
    legend: LegendCorner::UpperRight,
};

pub const ANNUAL_TQMEAN: ChartDefinition = ChartDefinition {
    file_name: "AnnualTQmean.png",
    title: "Annual TQ Mean",
    x_label: "Year",
    y_label: "TQmean (UNITLESS)",
    x_axis: XAxis::Date,
    style: ChartStyle::Line,
    legend: LegendCorner::UpperRight,
};

pub const ANNUAL_RB_INDEX: ChartDefinition = ChartDefinition {
    file_name: "AnnualRBindex.png",
    title: "Annual R-B Index",
    x_label: "Year",
    y_label: "R-B Index (UNITLESS)",
    x_axis: XAxis::Date,
    style: ChartStyle::Line,
    legend: LegendCorner::UpperRight,
};

pub const MONTHLY_MEAN_FLOW: ChartDefinition = ChartDefinition {
    file_name: "MonthlyMeanFlow.png",
    title: "Monthly Mean Flow",
    x_label: "Month Number",
    y_label: "Mean Flow (ft^3/s)",
    x_axis: XAxis::Month,
    style: ChartStyle::Line,
    legend: LegendCorner::UpperRight,
};

pub const EXCEEDANCE_PROBABILITY: ChartDefinition = ChartDefinition {
    file_name: "ExceedanceProbability.png",
    title: "Peak Flow Probability",
    x_label: "Exceedance Probability",
    y_label: "Peak Flow (ft^3/s)",
    x_axis: XAxis::ExceedanceProbability,
    style: ChartStyle::Points,
    legend: LegendCorner::UpperLeft,
};

/// Every chart the report writes
pub const ALL_CHARTS: [ChartDefinition; 6] = [
    DAILY_DISCHARGE_5_YEAR,
    ANNUAL_COEFF_VAR,
    ANNUAL_TQMEAN,
    ANNUAL_RB_INDEX,
    MONTHLY_MEAN_FLOW,
    EXCEEDANCE_PROBABILITY,
];

/// One station's data on a chart. `None` y values leave a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<(f64, Option<f64>)>,
}

impl ChartSeries {
    pub fn from_dated(label: impl Into<String>, values: &[(NaiveDate, Option<f64>)]) -> Self {
        Self {
            label: label.into(),
            points: values
                .iter()
                .map(|(date, v)| (decimal_year(*date), *v))
                .collect(),
        }
    }

    pub fn from_monthly(label: impl Into<String>, values: &[(u32, Option<f64>)]) -> Self {
        Self {
            label: label.into(),
            points: values.iter().map(|(m, v)| (f64::from(*m), *v)).collect(),
        }
    }

    pub fn from_exceedance(label: impl Into<String>, points: &[(f64, f64)]) -> Self {
        Self {
            label: label.into(),
            points: points
                .iter()
                .map(|(p, v)| (XAxis::probability_to_x(*p), Some(*v)))
                .collect(),
        }
    }

    /// Points with a value, in order
    pub fn present_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points
            .iter()
            .filter_map(|(x, y)| y.map(|y| (*x, y)))
    }

    /// Unbroken stretches of present values. Always returns at least one
    /// (possibly empty) run so the series still gets a legend entry.
    pub fn line_runs(&self) -> Vec<Vec<(f64, f64)>> {
        let mut runs = vec![Vec::new()];
        for (x, y) in &self.points {
            match y {
                Some(y) => {
                    if let Some(run) = runs.last_mut() {
                        run.push((*x, *y));
                    }
                }
                None => {
                    if runs.last().is_some_and(|run| !run.is_empty()) {
                        runs.push(Vec::new());
                    }
                }
            }
        }
        if runs.len() > 1 && runs.last().is_some_and(|run| run.is_empty()) {
            runs.pop();
        }
        runs
    }
}

/// A chart ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub definition: ChartDefinition,
    /// Title as drawn, including any configured suffix
    pub title: String,
    pub series: Vec<ChartSeries>,
}

impl Chart {
    pub fn new(
        definition: ChartDefinition,
        title_suffix: Option<&str>,
        series: Vec<ChartSeries>,
    ) -> Self {
        let title = match title_suffix {
            Some(suffix) if !suffix.trim().is_empty() => {
                format!("{} - {}", definition.title, suffix.trim())
            }
            _ => definition.title.to_string(),
        };
        Self {
            definition,
            title,
            series,
        }
    }
}

/// Year plus the elapsed fraction of that year
pub fn decimal_year(date: NaiveDate) -> f64 {
    let days_in_year = if date.leap_year() { 366.0 } else { 365.0 };
    f64::from(date.year()) + f64::from(date.ordinal0()) / days_in_year
}
