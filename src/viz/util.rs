//! Utility functions for visualization: colors, value formatting, axis ranges and gutters.

use plotters::prelude::*;

/// Microsoft Office (2013+) chart series palette, first entries only.
const OFFICE: [RGBColor; 3] = [
    RGBColor(68, 114, 196), // blue      (#4472C4)
    RGBColor(237, 125, 49), // orange    (#ED7D31)
    RGBColor(112, 173, 71), // green     (#70AD47)
];

/// Get a color from the Office palette.
#[inline]
pub fn office_color(idx: usize) -> RGBAColor {
    OFFICE[idx % OFFICE.len()].to_rgba()
}

/// How values are written on the Y axis and on point labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// One decimal, e.g. `10.5` (births per 1,000 people).
    Rate,
    /// Millions with one decimal, e.g. `38.0M`.
    Millions,
}

impl ValueFormat {
    pub fn format(self, v: f64) -> String {
        match self {
            ValueFormat::Rate => format!("{v:.1}"),
            ValueFormat::Millions => format!("{:.1}M", v / 1.0e6),
        }
    }
}

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Y range covering `values` with headroom above for point labels.
///
/// Falls back to `0..1` for no values and widens a flat series so the axis is not degenerate.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        let bump = if lo == 0.0 { 1.0 } else { lo.abs() * 0.05 };
        lo -= bump;
        hi += bump;
    }
    let span = hi - lo;
    (lo - span * 0.08, hi + span * 0.15)
}

/// Width of the left label area (pixels) for the tick labels `fmt` will produce on `lo..hi`.
pub fn compute_left_label_area_px(
    lo: f64,
    hi: f64,
    ticks: usize,
    font_px: u32,
    fmt: ValueFormat,
) -> u32 {
    let mut max_px = 0u32;
    for i in 0..=ticks {
        let t = if ticks == 0 {
            0.0
        } else {
            i as f64 / ticks as f64
        };
        let s = fmt.format(lo + (hi - lo) * t);
        max_px = max_px.max(estimate_text_width_px(&s, font_px));
    }
    // Room for tick marks and the rotated axis description.
    max_px.saturating_add(40).clamp(60, 160)
}
