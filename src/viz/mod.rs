//! Visualization: single-series year charts rendered to **PNG** or **SVG**, and the
//! interactive HTML chart of Canada's yearly birth share.
//!
//! - Line + point markers, light grid, value labels on even years
//! - Caption carries the year window, e.g. `Canada Birth Rate Over Time (2014-2023)`
//! - Output format follows the file extension (`.svg` → SVG, anything else → PNG)

pub mod interactive;
pub mod util;

pub use interactive::write_chance_chart;
pub use util::ValueFormat;

use crate::error::{PipelineError, Result};

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;
use std::sync::Once;

use util::{compute_left_label_area_px, office_color, padded_range};

/// One-time registration for a fallback "sans-serif" font when using the `ab_glyph` text path.
/// Required because `ab_glyph` doesn't discover OS fonts.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        // from `src/viz/mod.rs` → project root → `assets/DejaVuSans.ttf`
        let _ = plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
    });
}

fn render_err<E: std::fmt::Debug>(e: E) -> PipelineError {
    PipelineError::render(format!("{e:?}"))
}

/// A single series over a window of years.
#[derive(Debug, Clone)]
pub struct YearChart<'a> {
    /// Caption without the window; `" (start-end)"` is appended.
    pub title: &'a str,
    pub y_desc: &'a str,
    /// Inclusive year range shown on the X axis.
    pub window: (i32, i32),
    /// `(year, value)` pairs; need not be sorted.
    pub points: &'a [(i32, f64)],
    pub format: ValueFormat,
}

impl YearChart<'_> {
    pub fn caption(&self) -> String {
        format!("{} ({}-{})", self.title, self.window.0, self.window.1)
    }
}

/// Render `chart` to `out_path` at `width`×`height` pixels.
///
/// An empty series still produces a file with axes and caption.
pub fn plot_year_chart<P: AsRef<Path>>(
    chart: &YearChart<'_>,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    if chart.window.0 > chart.window.1 {
        return Err(PipelineError::render(format!(
            "empty year window {}..={}",
            chart.window.0, chart.window.1
        )));
    }
    ensure_fonts_registered();
    let out_path = out_path.as_ref();

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(out_path, (width, height)).into_drawing_area();
        draw_year_chart(root, chart)
    } else {
        let root = BitMapBackend::new(out_path, (width, height)).into_drawing_area();
        draw_year_chart(root, chart)
    }
}

fn draw_year_chart<DB>(root: DrawingArea<DB, Shift>, chart: &YearChart<'_>) -> Result<()>
where
    DB: DrawingBackend,
{
    const Y_TICKS: usize = 10;
    const LABEL_PX: u32 = 14;

    root.fill(&WHITE).map_err(render_err)?;

    let mut series: Vec<(f64, f64)> = chart
        .points
        .iter()
        .filter(|(y, v)| *y >= chart.window.0 && *y <= chart.window.1 && v.is_finite())
        .map(|(y, v)| (*y as f64, *v))
        .collect();
    series.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (y_lo, y_hi) = padded_range(series.iter().map(|(_, v)| *v));
    let x_lo = chart.window.0 as f64 - 0.5;
    let x_hi = chart.window.1 as f64 + 0.5;
    let left_px = compute_left_label_area_px(y_lo, y_hi, Y_TICKS, LABEL_PX, chart.format);

    let mut cc = ChartBuilder::on(&root)
        .margin(20)
        .caption(chart.caption(), ("sans-serif", 28))
        .set_label_area_size(LabelAreaPosition::Left, left_px)
        .set_label_area_size(LabelAreaPosition::Bottom, 60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(render_err)?;

    let fmt = chart.format;
    // Whole years only; fractional key points get an empty label.
    let x_label_fmt = |x: &f64| {
        if (x - x.round()).abs() < 1e-9 {
            format!("{:.0}", x)
        } else {
            String::new()
        }
    };
    let y_label_fmt = |v: &f64| fmt.format(*v);
    let span = i64::from(chart.window.1) - i64::from(chart.window.0);
    let x_label_count = (span + 2).min(14) as usize;

    cc.configure_mesh()
        .x_desc("Year")
        .y_desc(chart.y_desc)
        .x_labels(x_label_count)
        .y_labels(Y_TICKS)
        .x_label_formatter(&x_label_fmt)
        .y_label_formatter(&y_label_fmt)
        .bold_line_style(BLACK.mix(0.12))
        .light_line_style(BLACK.mix(0.04))
        .label_style(("sans-serif", LABEL_PX))
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(render_err)?;

    if series.is_empty() {
        root.present().map_err(render_err)?;
        return Ok(());
    }

    let color = office_color(0);
    let line = ShapeStyle {
        color,
        filled: false,
        stroke_width: 3,
    };
    cc.draw_series(LineSeries::new(series.clone(), line))
        .map_err(render_err)?;
    cc.draw_series(
        series
            .iter()
            .map(|(x, y)| Circle::new((*x, *y), 5, color.filled())),
    )
    .map_err(render_err)?;

    // Every other year keeps neighbouring labels from overlapping.
    let label_style =
        TextStyle::from(("sans-serif", 12).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    cc.draw_series(
        series
            .iter()
            .filter(|(x, _)| (*x as i64) % 2 == 0)
            .map(|(x, y)| {
                EmptyElement::at((*x, *y))
                    + Text::new(fmt.format(*y), (0, -10), label_style.clone())
            }),
    )
    .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}
