//! Text chart rendering
//!
//! Charts are drawn with block characters and written to the charts
//! directory; the observation carries the file path and a preview.

use crate::errors::{AgentError, Result};
use crate::tools::implementations::text::format_general;
use crate::tools::types::{Tool, ToolCategory, ToolContext};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Width of the longest bar, in cells
const BAR_WIDTH: usize = 40;
const PLOT_WIDTH: usize = 60;
const PLOT_HEIGHT: usize = 16;
const DEFAULT_BINS: usize = 10;
const SERIES_GLYPHS: &[char] = &['█', '▓', '▒', '░', '■', '▪'];

const FORMAT_HINT: &str = "Expected format: {\"chart_type\": \"bar\", \"title\": \"My Chart\", \
                           \"data\": {\"labels\": [...], \"values\": [...]}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    Histogram,
    Area,
}

impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Pie,
        ChartType::Scatter,
        ChartType::Histogram,
        ChartType::Area,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Histogram => "histogram",
            ChartType::Area => "area",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub labels: Vec<Value>,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default)]
    pub series: Vec<Series>,
    #[serde(default)]
    pub x: Vec<f64>,
    #[serde(default)]
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartSpec {
    #[serde(default = "default_title")]
    pub title: String,
    pub data: ChartData,
    #[serde(default)]
    pub xlabel: Option<String>,
    #[serde(default)]
    pub ylabel: Option<String>,
    #[serde(default)]
    pub bins: Option<usize>,
}

fn default_title() -> String {
    "Chart".to_string()
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn bar(value: f64, max: f64, glyph: char) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * BAR_WIDTH as f64).round() as usize;
    std::iter::repeat(glyph).take(cells.max(1)).collect()
}

/// Horizontal bars, one row per label and series
fn render_bars(labels: &[String], series: &[Series]) -> Result<String> {
    for s in series {
        if s.values.len() != labels.len() {
            return Err(AgentError::InvalidInput(format!(
                "series '{}' has {} values for {} labels",
                s.name,
                s.values.len(),
                labels.len()
            )));
        }
    }

    let max = series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .fold(0.0_f64, f64::max);
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut lines = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        for (j, s) in series.iter().enumerate() {
            let glyph = SERIES_GLYPHS[j % SERIES_GLYPHS.len()];
            let name = if j == 0 { label.as_str() } else { "" };
            lines.push(format!(
                "{:>width$} | {} {}",
                name,
                bar(s.values[i], max, glyph),
                format_general(s.values[i], 6),
                width = label_width
            ));
        }
    }

    if series.len() > 1 {
        let legend: Vec<String> = series
            .iter()
            .enumerate()
            .map(|(j, s)| format!("{} {}", SERIES_GLYPHS[j % SERIES_GLYPHS.len()], s.name))
            .collect();
        lines.push(String::new());
        lines.push(format!("Legend: {}", legend.join("  ")));
    }

    Ok(lines.join("\n"))
}

fn render_pie(labels: &[String], values: &[f64]) -> Result<String> {
    if labels.len() != values.len() {
        return Err(AgentError::InvalidInput(
            "pie charts need one value per label".to_string(),
        ));
    }
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Err(AgentError::InvalidInput(
            "pie chart values must sum to a positive number".to_string(),
        ));
    }

    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    Ok(labels
        .iter()
        .zip(values)
        .map(|(label, value)| {
            let share = value / total * 100.0;
            format!(
                "{:>width$} | {} {:.1}%",
                label,
                bar(share, 100.0, '█'),
                share,
                width = label_width
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Bucket counts over `bins` equal-width intervals
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    let bins = bins.max(1);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() || !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }

    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };
    let mut counts = vec![0usize; bins];
    for v in values {
        let index = (((v - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = min + width * i as f64;
            (start, start + width, count)
        })
        .collect()
}

fn render_histogram(values: &[f64], bins: usize) -> Result<String> {
    if values.is_empty() {
        return Err(AgentError::InvalidInput(
            "histograms need a non-empty 'values' list".to_string(),
        ));
    }
    let buckets = histogram(values, bins);
    let labels: Vec<String> = buckets
        .iter()
        .map(|(start, end, _)| format!("{}-{}", format_general(*start, 4), format_general(*end, 4)))
        .collect();
    let series = [Series {
        name: "count".to_string(),
        values: buckets.iter().map(|(_, _, c)| *c as f64).collect(),
    }];
    render_bars(&labels, &series)
}

fn render_scatter(x: &[f64], y: &[f64]) -> Result<String> {
    if x.is_empty() || x.len() != y.len() {
        return Err(AgentError::InvalidInput(
            "scatter plots need equal-length, non-empty 'x' and 'y' lists".to_string(),
        ));
    }

    let bounds = |v: &[f64]| {
        let lo = v.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if hi > lo {
            (lo, hi)
        } else {
            (lo - 1.0, hi + 1.0)
        }
    };
    let (x_lo, x_hi) = bounds(x);
    let (y_lo, y_hi) = bounds(y);

    let mut grid = vec![vec![' '; PLOT_WIDTH]; PLOT_HEIGHT];
    for (px, py) in x.iter().zip(y) {
        let col = ((px - x_lo) / (x_hi - x_lo) * (PLOT_WIDTH - 1) as f64).round() as usize;
        let row = ((py - y_lo) / (y_hi - y_lo) * (PLOT_HEIGHT - 1) as f64).round() as usize;
        grid[PLOT_HEIGHT - 1 - row.min(PLOT_HEIGHT - 1)][col.min(PLOT_WIDTH - 1)] = '●';
    }

    let top = format_general(y_hi, 4);
    let bottom = format_general(y_lo, 4);
    let gutter = top.len().max(bottom.len());

    let mut lines = Vec::with_capacity(PLOT_HEIGHT + 2);
    for (i, row) in grid.iter().enumerate() {
        let axis = match i {
            0 => top.clone(),
            i if i == PLOT_HEIGHT - 1 => bottom.clone(),
            _ => String::new(),
        };
        lines.push(format!("{:>gutter$} |{}", axis, row.iter().collect::<String>()));
    }
    lines.push(format!("{:>gutter$} +{}", "", "-".repeat(PLOT_WIDTH)));
    lines.push(format!(
        "{:>gutter$}  {}{:>width$}",
        "",
        format_general(x_lo, 4),
        format_general(x_hi, 4),
        width = PLOT_WIDTH - format_general(x_lo, 4).len()
    ));

    Ok(lines.join("\n"))
}

/// Draw `spec` as text
pub fn render_chart(chart_type: ChartType, spec: &ChartSpec) -> Result<String> {
    let data = &spec.data;
    let labels: Vec<String> = data.labels.iter().map(label_text).collect();

    let body = match chart_type {
        ChartType::Bar | ChartType::Line | ChartType::Area => {
            let series = if data.series.is_empty() {
                vec![Series {
                    name: spec.ylabel.clone().unwrap_or_default(),
                    values: data.values.clone(),
                }]
            } else {
                data.series.clone()
            };
            if labels.is_empty() {
                return Err(AgentError::InvalidInput(format!(
                    "{} charts need a non-empty 'labels' list",
                    chart_type.as_str()
                )));
            }
            render_bars(&labels, &series)?
        }
        ChartType::Pie => render_pie(&labels, &data.values)?,
        ChartType::Histogram => render_histogram(&data.values, spec.bins.unwrap_or(DEFAULT_BINS))?,
        ChartType::Scatter => {
            let x = if data.x.is_empty() {
                data.labels.iter().filter_map(Value::as_f64).collect()
            } else {
                data.x.clone()
            };
            let y = if data.y.is_empty() { &data.values } else { &data.y };
            render_scatter(&x, y)?
        }
    };

    let mut out = vec![spec.title.clone(), "=".repeat(spec.title.chars().count()), body];
    let axes: Vec<String> = [("x", &spec.xlabel), ("y", &spec.ylabel)]
        .iter()
        .filter_map(|(axis, label)| label.as_ref().map(|l| format!("{}: {}", axis, l)))
        .collect();
    if !axes.is_empty() {
        out.push(axes.join("  "));
    }
    Ok(out.join("\n"))
}

/// Chart tool
#[derive(Debug, Clone)]
pub struct ChartTool {
    context: Arc<ToolContext>,
}

impl ChartTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }

    async fn save(&self, chart_type: ChartType, contents: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.context.charts_dir).await?;
        let filename = format!(
            "chart_{}_{}.txt",
            chart_type.as_str(),
            chrono::Local::now().format("%Y%m%d_%H%M%S_%3f")
        );
        let path = self.context.charts_dir.join(filename);
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }
}

#[async_trait]
impl Tool for ChartTool {
    fn name(&self) -> &str {
        "create_chart"
    }

    fn description(&self) -> &str {
        "Generate charts from data. Saves text charts to the charts folder.\n\n\
         CHART TYPES: bar, line, pie, scatter, histogram, area\n\n\
         BASIC FORMAT:\n\
         {\"chart_type\": \"bar\", \"title\": \"My Chart\", \"data\": {\"labels\": [\"A\", \"B\"], \"values\": [10, 20]}}\n\n\
         OPTIONS:\n- xlabel/ylabel: Axis labels\n\n\
         MULTIPLE SERIES:\n\
         {\"chart_type\": \"line\", \"data\": {\"labels\": [...], \"series\": [{\"name\": \"A\", \"values\": [...]}, ...]}}\n\n\
         SCATTER: {\"data\": {\"x\": [...], \"y\": [...]}}\n\n\
         HISTOGRAM: {\"data\": {\"values\": [...]}, \"bins\": 10}"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Visualization
    }

    async fn call(&self, query: &str) -> Result<String> {
        let raw: Value = match serde_json::from_str(query.trim()) {
            Ok(v) => v,
            Err(e) => return Ok(format!("Error: Invalid JSON input. {}\n\n{}", e, FORMAT_HINT)),
        };

        let Some(type_name) = raw.get("chart_type").and_then(Value::as_str) else {
            return Ok(
                "Error: Missing 'chart_type'. Options: bar, line, pie, scatter, histogram, area."
                    .to_string(),
            );
        };
        if raw.get("data").is_none() {
            return Ok("Error: Missing 'data' field.".to_string());
        }
        let Some(chart_type) = ChartType::parse(type_name) else {
            let options: Vec<&str> = ChartType::ALL.iter().map(ChartType::as_str).collect();
            return Ok(format!(
                "Error: Unknown chart_type '{}'. Options: {}",
                type_name,
                options.join(", ")
            ));
        };

        let spec: ChartSpec = serde_json::from_value(raw)?;
        let chart = render_chart(chart_type, &spec)?;
        let path = self.save(chart_type, &chart).await?;

        tracing::info!(path = %path.display(), chart_type = chart_type.as_str(), "chart written");

        Ok(format!(
            "Chart saved successfully!\nFile: {}\nType: {}\nTitle: {}\n\n{}",
            path.display(),
            chart_type.as_str(),
            spec.title,
            chart
        ))
    }
}
