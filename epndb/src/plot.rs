///! Interactive profile plots, rendered as self-contained HTML documents
///!
///! Each plot is a single HTML file that pulls Plotly.js from its CDN and
///! carries the traces inline as JSON, so it opens in any browser with
///! zooming and hover tooltips and needs nothing else installed.
use ndarray::Array2;
use serde_json::json;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{Profile, Pulsar, Stokes};
use crate::error::{Error, Result};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>__PAGE_TITLE__</title>
    <script src="__PLOTLY_CDN__"></script>
    <style>
        body { margin: 0; background: #111111; }
        #chart { width: 100vw; height: 100vh; }
    </style>
</head>
<body>
    <div id="chart"></div>
    <script>
        const data = __DATA__;
        const layout = __LAYOUT__;
        Plotly.newPlot('chart', data, layout, {
            scrollZoom: true,
            displaylogo: false,
            displayModeBar: true
        });
    </script>
</body>
</html>
"##;

#[derive(Debug, Clone)]
pub struct PlotOptions {
    /// Subtract the median from each trace
    pub baseline: bool,
    /// Divide each trace by its maximum
    pub normalise: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            baseline: true,
            normalise: false,
        }
    }
}

/// Title in the archive's own phrasing.
pub fn profile_title(pulsar: &Pulsar, profile: &Profile) -> String {
    format!(
        "Profile for PSR {} at ν = {} MHz.",
        pulsar.jname, profile.freq_mhz
    )
}

/// Render a sample matrix as an interactive plot document.
///
/// One trace per Stokes parameter. The x axis is the phase-bin offset from
/// the peak sample, so profiles observed at different frequencies line up.
pub fn render_html(
    title: &str,
    data: &Array2<f64>,
    stokes: &[Stokes],
    options: &PlotOptions,
) -> Result<String> {
    if data.nrows() != stokes.len() {
        return Err(Error::Parse(format!(
            "{} traces for {} Stokes parameters",
            data.nrows(),
            stokes.len()
        )));
    }

    let mut traces = Vec::new();
    for (row, s) in data.outer_iter().zip(stokes) {
        let mut y: Vec<f64> = row.to_vec();
        let peak = argmax(&y);
        let x: Vec<i64> = (0..y.len()).map(|i| i as i64 - peak as i64).collect();

        if options.normalise {
            let max = y[peak];
            if max != 0.0 {
                y.iter_mut().for_each(|v| *v /= max);
            }
        }
        if options.baseline {
            let med = median(&y);
            y.iter_mut().for_each(|v| *v -= med);
        }

        traces.push(json!({
            "x": x,
            "y": y,
            "name": s.to_string(),
            "mode": "lines",
            "hovertemplate": null,
        }));
    }

    let y_title = if options.normalise {
        "Normalised Flux Density"
    } else {
        "Flux Density"
    };

    let layout = json!({
        "title": { "text": title, "font": { "color": "goldenrod" } },
        "paper_bgcolor": "#111111",
        "plot_bgcolor": "#111111",
        "font": { "color": "white", "size": 16 },
        "hovermode": "x",
        "hoverlabel": { "bgcolor": "black", "font": { "color": "white", "size": 12 } },
        "xaxis": { "title": { "text": "Peak Offset" }, "gridcolor": "#333333" },
        "yaxis": { "title": { "text": y_title }, "gridcolor": "#333333" },
    });

    let data_json = serde_json::to_string(&traces)
        .map_err(|e| Error::Parse(format!("serializing plot traces: {e}")))?;
    let layout_json = serde_json::to_string(&layout)
        .map_err(|e| Error::Parse(format!("serializing plot layout: {e}")))?;

    Ok(PAGE_TEMPLATE
        .replace("__PAGE_TITLE__", &escape_html(title))
        .replace("__PLOTLY_CDN__", PLOTLY_CDN)
        .replace("__DATA__", &data_json)
        .replace("__LAYOUT__", &layout_json))
}

/// Render a profile plot and write it to `<dir>/<jname>.html`.
pub fn write_profile_plot(
    dir: &Path,
    pulsar: &Pulsar,
    profile: &Profile,
    data: &Array2<f64>,
    stokes: &[Stokes],
    options: &PlotOptions,
) -> Result<PathBuf> {
    let html = render_html(&profile_title(pulsar, profile), data, stokes, options)?;

    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let path = dir.join(format!("{}.html", pulsar.jname));
    fs::write(&path, html).map_err(|e| Error::io(&path, e))?;

    tracing::info!("Wrote plot to {}", path.display());
    Ok(path)
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
