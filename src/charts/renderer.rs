//! PNG rendering of a [`Chart`] with plotters.
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::charts::definitions::{Chart, ChartStyle, LegendCorner, XAxis};

/// Figure size in inches and output resolution
pub const FIGURE_WIDTH_IN: f64 = 9.0;
pub const FIGURE_HEIGHT_IN: f64 = 6.5;
pub const DPI: f64 = 96.0;
/// Base font size in points
pub const FONT_SIZE_PT: f64 = 20.0;

/// Series colours in station order
const SERIES_COLORS: [RGBColor; 2] = [RED, BLUE];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to draw {file}: {msg}")]
    Drawing { file: String, msg: String },
}

fn drawing_error<E: std::fmt::Display>(file: &'static str) -> impl Fn(E) -> ChartError {
    move |e| ChartError::Drawing {
        file: file.to_string(),
        msg: e.to_string(),
    }
}

/// Draws charts to fixed-size bitmaps
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    width_px: u32,
    height_px: u32,
    font_px: f64,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(FIGURE_WIDTH_IN, FIGURE_HEIGHT_IN, DPI, FONT_SIZE_PT)
    }
}

impl ChartRenderer {
    pub fn new(width_in: f64, height_in: f64, dpi: f64, font_pt: f64) -> Self {
        Self {
            width_px: (width_in * dpi).round() as u32,
            height_px: (height_in * dpi).round() as u32,
            font_px: font_pt * dpi / 72.0,
        }
    }

    pub fn size_px(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    /// Render `chart` to `output_dir/<file name>` and return the written path
    pub fn render(&self, chart: &Chart, output_dir: &Path) -> Result<PathBuf, ChartError> {
        let path = output_dir.join(chart.definition.file_name);
        debug!("Rendering {} to {}", chart.title, path.display());

        self.draw(chart, &path)?;

        info!("Wrote {}", path.display());
        Ok(path)
    }

    /// The backend borrows `path` and writes the file when presented
    fn draw(&self, chart: &Chart, path: &Path) -> Result<(), ChartError> {
        let def = chart.definition;
        let font = FontDesc::new(FontFamily::SansSerif, self.font_px, FontStyle::Normal);

        let root = BitMapBackend::new(path, (self.width_px, self.height_px)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing_error(def.file_name))?;

        let (x_range, y_range) = axis_ranges(chart);
        let font_px = self.font_px.round() as u32;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, font.clone())
            .margin(font_px / 2)
            .x_label_area_size(font_px * 3)
            .y_label_area_size(font_px * 4)
            .build_cartesian_2d(x_range, y_range)
            .map_err(drawing_error(def.file_name))?;

        let x_axis = def.x_axis;
        let x_formatter = move |x: &f64| x_axis.format_tick(*x);

        ctx.configure_mesh()
            .x_desc(def.x_label)
            .y_desc(def.y_label)
            .x_labels(6)
            .y_labels(6)
            .x_label_formatter(&x_formatter)
            .label_style(font.clone())
            .axis_desc_style(font.clone())
            .draw()
            .map_err(drawing_error(def.file_name))?;

        for (idx, series) in chart.series.iter().enumerate() {
            let color = SERIES_COLORS[idx % SERIES_COLORS.len()];

            match def.style {
                ChartStyle::Line => {
                    for (run_idx, run) in series.line_runs().into_iter().enumerate() {
                        let anno = ctx
                            .draw_series(LineSeries::new(run, color.stroke_width(2)))
                            .map_err(drawing_error(def.file_name))?;
                        if run_idx == 0 {
                            anno.label(series.label.as_str()).legend(move |(x, y)| {
                                PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(3))
                            });
                        }
                    }
                }
                ChartStyle::Points => {
                    ctx.draw_series(
                        series
                            .present_points()
                            .map(|(x, y)| Circle::new((x, y), 6, color.filled())),
                    )
                    .map_err(drawing_error(def.file_name))?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| Circle::new((x + 15, y), 6, color.filled()));
                }
            }
        }

        let position = match def.legend {
            LegendCorner::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendCorner::UpperRight => SeriesLabelPosition::UpperRight,
        };
        ctx.configure_series_labels()
            .position(position)
            .label_font(font.clone())
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(drawing_error(def.file_name))?;

        root.present().map_err(drawing_error(def.file_name))?;
        Ok(())
    }
}

/// Data bounds with a margin; probability charts always span [0, 1]
fn axis_ranges(chart: &Chart) -> (Range<f64>, Range<f64>) {
    let points: Vec<(f64, f64)> = chart
        .series
        .iter()
        .flat_map(|s| s.present_points())
        .collect();

    let x_range = match chart.definition.x_axis {
        XAxis::ExceedanceProbability => 0.0..1.0,
        XAxis::Date | XAxis::Month => padded(points.iter().map(|p| p.0), 0.02),
    };
    let y_range = padded(points.iter().map(|p| p.1), 0.05);

    (x_range, y_range)
}

fn padded(values: impl Iterator<Item = f64>, fraction: f64) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 0.5)..(max + 0.5);
    }

    let pad = (max - min) * fraction;
    (min - pad)..(max + pad)
}
