//! Self-contained interactive HTML chart (Plotly.js from its CDN) of the yearly birth share.

use crate::error::Result;
use crate::models::YearlySummary;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
pub const CHANCE_TITLE: &str = "Chance of Being Born in Canada by Year";

/// Plotly figure (`{"data": [...], "layout": {...}}`) for `chance_percent` against year.
///
/// Points are ordered by ascending year whatever the input order. The layout mirrors a
/// "plotly_white" look: white background, light grid, unified hover, 3-decimal y ticks.
pub fn chance_figure(rows: &[YearlySummary]) -> Value {
    let mut sorted: Vec<&YearlySummary> = rows.iter().collect();
    sorted.sort_by_key(|r| r.year);
    let years: Vec<i32> = sorted.iter().map(|r| r.year).collect();
    let chance: Vec<f64> = sorted.iter().map(|r| r.chance_percent).collect();

    let grid = "#EBF0F8";
    json!({
        "data": [{
            "type": "scatter",
            "mode": "lines+markers",
            "name": "Chance (%)",
            "x": years,
            "y": chance,
            "line": { "width": 2, "color": "#636EFA" },
            "hovertemplate": "Year=%{x}<br>Chance (%)=%{y:.3f}<extra></extra>"
        }],
        "layout": {
            "title": { "text": CHANCE_TITLE },
            "xaxis": { "title": { "text": "Year" }, "gridcolor": grid, "zeroline": false },
            "yaxis": {
                "title": { "text": "Chance (%)" },
                "tickformat": ".3f",
                "gridcolor": grid,
                "zeroline": false
            },
            "hovermode": "x unified",
            "paper_bgcolor": "white",
            "plot_bgcolor": "white",
            "font": { "color": "#2a3f5f" }
        }
    })
}

/// Render the figure into a standalone HTML page.
pub fn chance_html(rows: &[YearlySummary]) -> Result<String> {
    let fig = chance_figure(rows);
    // Keep a literal "</script>" in the JSON from closing the inline script early.
    let data = serde_json::to_string(&fig["data"])?.replace("</", "<\\/");
    let layout = serde_json::to_string(&fig["layout"])?.replace("</", "<\\/");
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<title>{CHANCE_TITLE}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:100vh;"></div>
<script>
Plotly.newPlot("chart", {data}, {layout}, {{"responsive": true}});
</script>
</body>
</html>
"#
    ))
}

/// Write the interactive chart, replacing any existing file.
pub fn write_chance_chart<P: AsRef<Path>>(rows: &[YearlySummary], out_path: P) -> Result<()> {
    fs::write(out_path, chance_html(rows)?)?;
    Ok(())
}
