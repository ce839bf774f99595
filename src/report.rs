//! Feature table report: chart series, correlation heatmap, head preview and
//! the HTTP routes serving them.

use std::fmt::Write as _;
use std::sync::{Arc, RwLock};

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::correlation::{
    correlation_matrix, CorrelationError, CorrelationMatrix, DEFAULT_CORRELATION_COLUMNS,
};
use crate::features::{FeatureDType, FeatureTable, FeatureTransformReport};

pub const DEFAULT_HEAD_ROWS: usize = 5;

const CHART_WIDTH: f64 = 960.0;
const CHART_HEIGHT: f64 = 320.0;
const CHART_PAD: f64 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub ts_ms_utc: i64,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub color: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub y_label: String,
    pub lines: Vec<ChartSeries>,
    /// Scatter overlay, drawn as points instead of a polyline.
    pub markers: Option<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureReport {
    pub source: String,
    pub rows: usize,
    pub schema_fingerprint: String,
    pub transform: FeatureTransformReport,
    pub charts: Vec<Chart>,
    pub correlation: CorrelationMatrix,
    pub head: String,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("correlation failed: {0}")]
    Correlation(#[from] CorrelationError),
    #[error("feature table has no column {0}")]
    MissingColumn(&'static str),
}

pub fn build_feature_report(
    table: &FeatureTable,
    source: &str,
) -> Result<FeatureReport, ReportError> {
    let rolling_mean = table_column(table, "rolling_mean_temp")?;
    let maintenance = table_column(table, "time_since_last_maintenance")?;
    let failure = table_column(table, "failure")?;
    let cumulative_hours = table_column(table, "cumulative_hours")?;
    let cumulative_failures = table_column(table, "cumulative_failures")?;
    let timestamps: Vec<i64> = table
        .rows
        .iter()
        .map(|row| row.timestamp().timestamp_millis())
        .collect();

    let charts = vec![
        Chart {
            title: "Rolling Mean Temperature and Failure Events".to_string(),
            y_label: "Temperature".to_string(),
            lines: vec![series(
                "Rolling Mean Temperature",
                "#1f5fbf",
                &timestamps,
                &rolling_mean,
            )],
            markers: Some(failure_markers(&timestamps, &failure, &rolling_mean)),
        },
        Chart {
            title: "Time Since Last Maintenance and Failure Events".to_string(),
            y_label: "Time (seconds)".to_string(),
            lines: vec![series(
                "Time Since Last Maintenance",
                "#e08a00",
                &timestamps,
                &maintenance,
            )],
            markers: Some(failure_markers(&timestamps, &failure, &maintenance)),
        },
        Chart {
            title: "Cumulative Operation Hours vs Cumulative Failures".to_string(),
            y_label: "Cumulative Values".to_string(),
            lines: vec![
                series(
                    "Cumulative Operation Hours",
                    "#2e8b3a",
                    &timestamps,
                    &cumulative_hours,
                ),
                series(
                    "Cumulative Failures",
                    "#c0392b",
                    &timestamps,
                    &cumulative_failures,
                ),
            ],
            markers: None,
        },
    ];

    let correlation = correlation_matrix(table, &DEFAULT_CORRELATION_COLUMNS)?;
    let report = FeatureReport {
        source: source.to_string(),
        rows: table.len(),
        schema_fingerprint: table.schema.fingerprint.clone(),
        transform: table.report.clone(),
        charts,
        correlation,
        head: format_head(table, DEFAULT_HEAD_ROWS),
    };

    info!(
        component = "report",
        event = "report.build.finish",
        source = %report.source,
        rows = report.rows,
        charts = report.charts.len()
    );

    Ok(report)
}

/// Fixed-width text preview of the first `n` rows across every schema column.
pub fn format_head(table: &FeatureTable, n: usize) -> String {
    let mut header = vec!["timestamp".to_string()];
    header.extend(table.schema.columns.iter().map(|c| c.name.clone()));

    let mut cells: Vec<Vec<String>> = vec![header];
    for (idx, row) in table.rows.iter().take(n).enumerate() {
        let mut line = vec![format!(
            "{idx} {}",
            row.timestamp().format("%Y-%m-%d %H:%M:%S")
        )];
        for column in &table.schema.columns {
            let value = row.value(&column.name).flatten();
            line.push(format_cell(value, column.dtype));
        }
        cells.push(line);
    }

    let widths: Vec<usize> = (0..cells[0].len())
        .map(|col| cells.iter().map(|line| line[col].len()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for line in &cells {
        let rendered: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:>width$}"))
            .collect();
        out.push_str(rendered.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn format_correlation(matrix: &CorrelationMatrix) -> String {
    let width = matrix.columns.iter().map(|c| c.len()).max().unwrap_or(0);
    let mut out = format!("{:width$}", "");
    for column in &matrix.columns {
        let _ = write!(out, "  {column:>width$}");
    }
    out.push('\n');
    for (name, values) in matrix.columns.iter().zip(&matrix.values) {
        let _ = write!(out, "{name:>width$}");
        for value in values {
            let cell = value.map_or_else(|| "NaN".to_string(), |v| format!("{v:.2}"));
            let _ = write!(out, "  {cell:>width$}");
        }
        out.push('\n');
    }
    out
}

pub trait ReportSnapshotSource: Send + Sync + 'static {
    fn snapshot(&self) -> FeatureReport;
}

#[derive(Clone)]
pub struct InMemoryReportSource {
    inner: Arc<RwLock<FeatureReport>>,
}

impl InMemoryReportSource {
    pub fn new(report: FeatureReport) -> Self {
        Self {
            inner: Arc::new(RwLock::new(report)),
        }
    }

    pub fn replace_report(&self, report: FeatureReport) {
        let mut guard = self
            .inner
            .write()
            .expect("in-memory report lock should not be poisoned");
        *guard = report;
    }
}

impl ReportSnapshotSource for InMemoryReportSource {
    fn snapshot(&self) -> FeatureReport {
        self.inner
            .read()
            .expect("in-memory report lock should not be poisoned")
            .clone()
    }
}

pub fn report_router(source: Arc<dyn ReportSnapshotSource>) -> Router {
    Router::new()
        .route("/report", get(get_report_html))
        .route("/report/snapshot", get(get_report_snapshot))
        .with_state(ReportAppState { source })
}

pub fn render_report_html(report: &FeatureReport) -> String {
    let now_utc = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>Sensor Feature Report</title>\n");
    out.push_str("<style>body{margin:0;color:#182026;font-family:\"Avenir Next\",\"Segoe UI\",sans-serif;background:linear-gradient(160deg,#f5f1e7,#e9f0f2);min-height:100vh}.shell{max-width:1100px;margin:0 auto;padding:24px 18px}.hero{background:linear-gradient(135deg,#102f3a 0%,#24576b 100%);color:#f7fbfc;border-radius:16px;padding:18px 20px}.hero h1{margin:0 0 8px;font-size:1.5rem}.hero-meta{display:flex;gap:16px;flex-wrap:wrap;font-size:.9rem;color:#dcebf0}.card{margin-top:16px;background:#fff;border:1px solid #cbd4db;border-radius:16px;padding:14px;overflow:auto}.card h2{margin:0 0 10px;font-size:1.05rem}svg text{font-size:11px;fill:#5f6a73}table.corr{border-collapse:collapse}table.corr th,table.corr td{padding:8px 10px;font-size:.8rem;text-align:center;border:1px solid #fff}table.corr th{background:#14343f;color:#f2f7f9}pre{font-size:.72rem;overflow:auto}</style>\n");
    out.push_str("</head><body><main class=\"shell\">\n");
    out.push_str("<section class=\"hero\"><h1>Sensor Feature Report</h1>");
    out.push_str("<div class=\"hero-meta\">\n");
    out.push_str(&format!(
        "<span>Source: {}</span>",
        escape_html(&report.source)
    ));
    out.push_str(&format!("<span>Rows: {}</span>", report.rows));
    out.push_str(&format!(
        "<span>Residual missing: {}</span>",
        report.transform.residual_missing
    ));
    out.push_str(&format!(
        "<span>Generated: {}</span>",
        escape_html(&now_utc)
    ));
    out.push_str("</div></section>\n");

    for chart in &report.charts {
        out.push_str("<section class=\"card\">");
        out.push_str(&format!("<h2>{}</h2>", escape_html(&chart.title)));
        out.push_str(&render_chart_svg(chart));
        out.push_str("</section>\n");
    }

    out.push_str("<section class=\"card\"><h2>Feature Correlation with Failure</h2>");
    out.push_str(&render_correlation_table(&report.correlation));
    out.push_str("</section>\n");

    out.push_str("<section class=\"card\"><h2>Head</h2><pre>");
    out.push_str(&escape_html(&report.head));
    out.push_str("</pre></section>\n");
    out.push_str("</main></body></html>\n");
    out
}

/// Diverging blue-white-red color for a coefficient in [-1, 1].
pub fn coolwarm(value: f64) -> String {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let t = value.clamp(-1.0, 1.0);
    let (from, to, frac) = if t < 0.0 {
        (MID, COLD, -t)
    } else {
        (MID, WARM, t)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * frac).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(from.0, to.0),
        mix(from.1, to.1),
        mix(from.2, to.2)
    )
}

fn table_column(table: &FeatureTable, name: &'static str) -> Result<Vec<Option<f64>>, ReportError> {
    table.column(name).ok_or(ReportError::MissingColumn(name))
}

fn series(label: &str, color: &str, timestamps: &[i64], values: &[Option<f64>]) -> ChartSeries {
    ChartSeries {
        label: label.to_string(),
        color: color.to_string(),
        points: timestamps
            .iter()
            .zip(values)
            .map(|(ts, value)| ChartPoint {
                ts_ms_utc: *ts,
                value: *value,
            })
            .collect(),
    }
}

/// Failure indicator scaled to the peak of `reference` so events sit at the
/// top of the plotted line.
fn failure_markers(
    timestamps: &[i64],
    failure: &[Option<f64>],
    reference: &[Option<f64>],
) -> ChartSeries {
    let peak = reference
        .iter()
        .flatten()
        .copied()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));
    let scaled: Vec<Option<f64>> = failure
        .iter()
        .map(|f| Some((*f)? * peak?))
        .collect();
    series("Failure Events", "#d62728", timestamps, &scaled)
}

fn render_chart_svg(chart: &Chart) -> String {
    let all_points = chart
        .lines
        .iter()
        .chain(chart.markers.iter())
        .flat_map(|s| s.points.iter());
    let mut bounds: Option<(i64, i64, f64, f64)> = None;
    for point in all_points {
        let Some(value) = point.value else { continue };
        bounds = Some(match bounds {
            None => (point.ts_ms_utc, point.ts_ms_utc, value, value),
            Some((x0, x1, y0, y1)) => (
                x0.min(point.ts_ms_utc),
                x1.max(point.ts_ms_utc),
                y0.min(value),
                y1.max(value),
            ),
        });
    }

    let mut out = format!(
        "<svg viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\" width=\"100%\" role=\"img\">"
    );
    let Some((x0, x1, y0, y1)) = bounds else {
        out.push_str("<text x=\"20\" y=\"30\">no data</text></svg>");
        return out;
    };

    let x_span = (x1 - x0).max(1) as f64;
    let y_span = if y1 > y0 { y1 - y0 } else { 1.0 };
    let project = |ts: i64, value: f64| {
        let x = CHART_PAD + (ts - x0) as f64 / x_span * (CHART_WIDTH - 2.0 * CHART_PAD);
        let y = CHART_HEIGHT - CHART_PAD - (value - y0) / y_span * (CHART_HEIGHT - 2.0 * CHART_PAD);
        (x, y)
    };

    let _ = write!(
        out,
        "<line x1=\"{CHART_PAD}\" y1=\"{0}\" x2=\"{1}\" y2=\"{0}\" stroke=\"#c8cfd5\"/>",
        CHART_HEIGHT - CHART_PAD,
        CHART_WIDTH - CHART_PAD
    );
    let _ = write!(
        out,
        "<text x=\"4\" y=\"{}\">{y1:.1}</text><text x=\"4\" y=\"{}\">{y0:.1}</text>",
        CHART_PAD,
        CHART_HEIGHT - CHART_PAD
    );
    let _ = write!(
        out,
        "<text x=\"{CHART_PAD}\" y=\"{}\">{}</text>",
        CHART_HEIGHT - 8.0,
        escape_html(&chart.y_label)
    );

    for line in &chart.lines {
        for segment in line.points.split(|p| p.value.is_none()) {
            if segment.is_empty() {
                continue;
            }
            let coords: Vec<String> = segment
                .iter()
                .filter_map(|p| p.value.map(|v| project(p.ts_ms_utc, v)))
                .map(|(x, y)| format!("{x:.1},{y:.1}"))
                .collect();
            let _ = write!(
                out,
                "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"2\" points=\"{}\"><title>{}</title></polyline>",
                escape_html(&line.color),
                coords.join(" "),
                escape_html(&line.label)
            );
        }
    }

    if let Some(markers) = &chart.markers {
        for point in &markers.points {
            let Some(value) = point.value else { continue };
            let (x, y) = project(point.ts_ms_utc, value);
            let _ = write!(
                out,
                "<circle class=\"marker\" cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"3\" fill=\"{}\" fill-opacity=\"0.6\"/>",
                escape_html(&markers.color)
            );
        }
    }

    out.push_str("</svg>");
    out
}

fn render_correlation_table(matrix: &CorrelationMatrix) -> String {
    let mut out = String::from("<table class=\"corr\"><thead><tr><th></th>");
    for column in &matrix.columns {
        let _ = write!(out, "<th>{}</th>", escape_html(column));
    }
    out.push_str("</tr></thead><tbody>");
    for (name, values) in matrix.columns.iter().zip(&matrix.values) {
        let _ = write!(out, "<tr><th>{}</th>", escape_html(name));
        for value in values {
            match value {
                Some(v) => {
                    let _ = write!(
                        out,
                        "<td style=\"background:{}\">{v:.2}</td>",
                        coolwarm(*v)
                    );
                }
                None => out.push_str("<td>-</td>"),
            }
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

fn format_cell(value: Option<f64>, dtype: FeatureDType) -> String {
    match (value, dtype) {
        (None, _) => "NaN".to_string(),
        (Some(v), FeatureDType::Bool) => (v != 0.0).to_string(),
        (Some(v), FeatureDType::U32 | FeatureDType::U64) => format!("{v:.0}"),
        (Some(v), FeatureDType::F64) => format!("{v:.6}"),
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[derive(Clone)]
struct ReportAppState {
    source: Arc<dyn ReportSnapshotSource>,
}

async fn get_report_html(State(state): State<ReportAppState>) -> impl IntoResponse {
    let report = state.source.snapshot();
    info!(
        component = "report",
        event = "http.report.request",
        rows = report.rows
    );
    Html(render_report_html(&report))
}

async fn get_report_snapshot(State(state): State<ReportAppState>) -> impl IntoResponse {
    let report = state.source.snapshot();
    info!(
        component = "report",
        event = "http.snapshot.request",
        rows = report.rows
    );
    Json(report)
}
