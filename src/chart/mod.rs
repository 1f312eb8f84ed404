pub mod svg;

use serde::Serialize;

use crate::aggregate::CategoryCounts;

pub const PALETTE: [&str; 9] = [
    "#0078D4", // blue
    "#FFB900", // yellow
    "#E74856", // red
    "#8764B8", // purple
    "#00B294", // teal
    "#FF8C00", // orange
    "#A4262C", // dark red
    "#498205", // green, never used for approved
    "#005A9E", // dark blue
];
pub const APPROVED_COLOR: &str = "#107C10";
pub const DEFAULT_APPROVED_LABEL: &str = "אושר ע\"י המשתמש";
pub const DEFAULT_APPROVED_MARKER: &str = "אושר";
pub const CENTER_CAPTION: &str = "Total";
pub const START_ANGLE: f64 = -90.0;
pub const HOLE_RATIO: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorScheme {
    approved_label: String,
    approved_marker: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::with_approved(DEFAULT_APPROVED_LABEL, DEFAULT_APPROVED_MARKER)
    }
}

impl ColorScheme {
    pub fn with_approved(label: &str, marker: &str) -> Self {
        Self {
            approved_label: label.to_string(),
            approved_marker: marker.to_string(),
        }
    }

    pub fn is_approved(&self, label: &str) -> bool {
        label == self.approved_label
            || (!self.approved_marker.is_empty() && label.contains(&self.approved_marker))
    }

    // The approved override does not consume a palette slot.
    pub fn color_for(&self, label: &str, index: usize) -> &'static str {
        if self.is_approved(label) {
            return APPROVED_COLOR;
        }
        PALETTE[index % PALETTE.len()]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArcSegment {
    pub label: String,
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: String,
}

impl ArcSegment {
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Distribution {
    pub total: usize,
    pub legend: Vec<LegendEntry>,
    pub arcs: Vec<ArcSegment>,
    pub caption: String,
}

impl Distribution {
    pub fn empty() -> Self {
        Self {
            total: 0,
            legend: Vec::new(),
            arcs: Vec::new(),
            caption: CENTER_CAPTION.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn center_label(&self) -> String {
        self.total.to_string()
    }
}

pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 100.0 / total as f64 * 10.0).round() / 10.0
}

fn angle_at(done: usize, total: usize) -> f64 {
    START_ANGLE + done as f64 / total as f64 * 360.0
}

pub fn render(counts: &CategoryCounts, scheme: &ColorScheme) -> Distribution {
    let total = counts.total();
    if total == 0 {
        return Distribution::empty();
    }

    let mut legend = Vec::with_capacity(counts.len());
    let mut arcs = Vec::with_capacity(counts.len());
    let mut done = 0usize;
    for (index, (label, count)) in counts.iter().enumerate() {
        let color = scheme.color_for(label, index).to_string();
        let start_angle = angle_at(done, total);
        done += count;
        arcs.push(ArcSegment {
            label: label.to_string(),
            start_angle,
            end_angle: angle_at(done, total),
            color: color.clone(),
        });
        legend.push(LegendEntry {
            label: label.to_string(),
            count,
            percentage: percentage(count, total),
            color,
        });
    }

    Distribution {
        total,
        legend,
        arcs,
        caption: CENTER_CAPTION.to_string(),
    }
}
