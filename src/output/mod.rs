pub mod report;

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::chart::Distribution;
use crate::dashboard::Dashboard;
use crate::grid::format::locale_datetime;
use crate::grid::{GridView, SortDirection};
use crate::source::RecordSource;
use crate::utils::{pad_right, single_line, truncate_chars};

const MAX_CELL_WIDTH: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum View {
    Chart,
    Grid,
    #[default]
    All,
}

impl View {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "chart" | "doughnut" => Some(Self::Chart),
            "grid" | "table" => Some(Self::Grid),
            "all" | "both" => Some(Self::All),
            _ => None,
        }
    }

    pub fn shows_chart(self) -> bool {
        matches!(self, Self::Chart | Self::All)
    }

    pub fn shows_grid(self) -> bool {
        matches!(self, Self::Grid | Self::All)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ChartPanel {
    pub distribution: Distribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GridPanel {
    pub view: GridView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DashboardReport {
    pub list_name: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridPanel>,
}

impl DashboardReport {
    pub fn from_dashboard<S: RecordSource>(dashboard: &Dashboard<S>, view: View) -> Self {
        let state = dashboard.snapshot();
        Self {
            list_name: dashboard.options().list_name.clone(),
            source: dashboard.source().describe(),
            last_updated: state.last_updated,
            chart: view.shows_chart().then(|| ChartPanel {
                distribution: dashboard.distribution(),
                error: state.chart_error.clone(),
            }),
            grid: view.shows_grid().then(|| GridPanel {
                view: dashboard.grid_view(),
                error: state.grid_error.clone(),
            }),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.chart.as_ref().is_some_and(|c| c.error.is_some())
            || self.grid.as_ref().is_some_and(|g| g.error.is_some())
    }

    pub fn last_updated_label(&self) -> String {
        self.last_updated
            .map(|ts| locale_datetime(&ts, &Local))
            .unwrap_or_else(|| "never".to_string())
    }
}

fn hex_rgb(color: &str) -> (u8, u8, u8) {
    let hex = color.trim_start_matches('#');
    if hex.len() != 6 {
        return (128, 128, 128);
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(128);
    (channel(0), channel(2), channel(4))
}

fn sort_marker(sorted: Option<SortDirection>) -> &'static str {
    match sorted {
        Some(SortDirection::Ascending) => " ▲",
        Some(SortDirection::Descending) => " ▼",
        None => "",
    }
}

fn render_chart_text(out: &mut String, panel: &ChartPanel) {
    out.push_str(&format!("{}\n", "Status Distribution".bold()));
    if let Some(err) = panel.error.as_deref() {
        out.push_str(&format!("{}\n\n", format!("Error: {err}").red()));
        return;
    }
    let dist = &panel.distribution;
    if dist.is_empty() {
        out.push_str("No data\n\n");
        return;
    }
    let width = dist
        .legend
        .iter()
        .map(|entry| crate::utils::display_width(&entry.label))
        .max()
        .unwrap_or(0);
    for entry in dist.legend.iter() {
        let (r, g, b) = hex_rgb(&entry.color);
        out.push_str(&format!(
            "  {} {}  {} ({:.1}%)\n",
            "■".truecolor(r, g, b),
            pad_right(&entry.label, width),
            entry.count,
            entry.percentage
        ));
    }
    out.push_str(&format!("  {} {}\n\n", dist.caption, dist.center_label().bold()));
}

fn render_grid_text(out: &mut String, panel: &GridPanel) {
    out.push_str(&format!("{}\n", "Recent Items".bold()));
    if let Some(err) = panel.error.as_deref() {
        out.push_str(&format!("{}\n\n", format!("Error: {err}").red()));
        return;
    }
    let view = &panel.view;
    let headers: Vec<String> = view
        .columns
        .iter()
        .map(|c| format!("{}{}", c.title, sort_marker(c.sorted)))
        .collect();
    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| truncate_chars(&single_line(cell), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| crate::utils::display_width(h)).collect();
    for row in rows.iter() {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(crate::utils::display_width(cell));
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, w)| pad_right(cell, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    out.push_str(&format!("{}\n", line(&headers).bold()));
    for row in rows.iter() {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push_str(&format!(
        "Page {} of {} ({} records)\n\n",
        view.current_page, view.total_pages, view.total_records
    ));
}

pub fn render_text(report: &DashboardReport) -> Vec<u8> {
    let mut out = String::new();
    if let Some(chart) = report.chart.as_ref() {
        render_chart_text(&mut out, chart);
    }
    if let Some(grid) = report.grid.as_ref() {
        render_grid_text(&mut out, grid);
    }
    out.push_str(&format!("Last updated: {}\n", report.last_updated_label()));
    out.into_bytes()
}

pub fn render_json(report: &DashboardReport) -> Vec<u8> {
    serde_json::to_vec_pretty(report).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(report: &DashboardReport) -> Vec<u8> {
    report::render_html(report)
}

pub fn render(report: &DashboardReport, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Json => render_json(report),
        OutputFormat::Html => render_html(report),
    }
}
