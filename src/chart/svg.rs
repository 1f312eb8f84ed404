use std::fmt::Write;

use thiserror::Error;

use super::{ArcSegment, Distribution, HOLE_RATIO};
use crate::utils::escape_xml;

const SEPARATOR_COLOR: &str = "#ffffff";
const TOTAL_COLOR: &str = "#323130";
const CAPTION_COLOR: &str = "#605e5c";
const FULL_CIRCLE_EPSILON: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid canvas geometry: {reason}")]
    Geometry { reason: String },

    #[error("non-finite angle in segment '{label}'")]
    NonFiniteAngle { label: String },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub outer_radius: f64,
    pub inner_radius: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::square(400.0, 150.0)
    }
}

impl Canvas {
    pub fn square(size: f64, outer_radius: f64) -> Self {
        Self {
            width: size,
            height: size,
            center_x: size / 2.0,
            center_y: size / 2.0,
            outer_radius,
            inner_radius: outer_radius * HOLE_RATIO,
        }
    }

    fn validate(&self) -> Result<(), RenderError> {
        let values = [
            self.width,
            self.height,
            self.center_x,
            self.center_y,
            self.outer_radius,
            self.inner_radius,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RenderError::Geometry {
                reason: "non-finite dimension".to_string(),
            });
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(RenderError::Geometry {
                reason: format!("empty canvas {}x{}", self.width, self.height),
            });
        }
        if self.inner_radius < 0.0 || self.outer_radius <= self.inner_radius {
            return Err(RenderError::Geometry {
                reason: format!(
                    "inner radius {} must be below outer radius {}",
                    self.inner_radius, self.outer_radius
                ),
            });
        }
        Ok(())
    }

    fn point(&self, radius: f64, degrees: f64) -> (f64, f64) {
        let radians = degrees.to_radians();
        (
            self.center_x + radius * radians.cos(),
            self.center_y + radius * radians.sin(),
        )
    }
}

fn num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn ring_path(canvas: &Canvas, start: f64, end: f64) -> String {
    let large = if end - start > 180.0 { 1 } else { 0 };
    let (ox0, oy0) = canvas.point(canvas.outer_radius, start);
    let (ox1, oy1) = canvas.point(canvas.outer_radius, end);
    let (ix1, iy1) = canvas.point(canvas.inner_radius, end);
    let (ix0, iy0) = canvas.point(canvas.inner_radius, start);
    let r = num(canvas.outer_radius);
    let ri = num(canvas.inner_radius);
    format!(
        "M {} {} A {r} {r} 0 {large} 1 {} {} L {} {} A {ri} {ri} 0 {large} 0 {} {} Z",
        num(ox0),
        num(oy0),
        num(ox1),
        num(oy1),
        num(ix1),
        num(iy1),
        num(ix0),
        num(iy0),
    )
}

fn segment_paths(canvas: &Canvas, arc: &ArcSegment) -> Result<Vec<String>, RenderError> {
    if !arc.start_angle.is_finite() || !arc.end_angle.is_finite() {
        return Err(RenderError::NonFiniteAngle {
            label: arc.label.clone(),
        });
    }
    let sweep = arc.sweep();
    if sweep <= 0.0 {
        return Ok(Vec::new());
    }
    // A single SVG arc cannot start and end on the same point.
    if sweep >= 360.0 - FULL_CIRCLE_EPSILON {
        let mid = arc.start_angle + 180.0;
        return Ok(vec![
            ring_path(canvas, arc.start_angle, mid),
            ring_path(canvas, mid, arc.start_angle + 360.0),
        ]);
    }
    Ok(vec![ring_path(canvas, arc.start_angle, arc.end_angle)])
}

pub fn draw(distribution: &Distribution, canvas: &Canvas) -> Result<String, RenderError> {
    canvas.validate()?;
    if distribution.is_empty() {
        return Ok(String::new());
    }

    let mut body = String::new();
    for arc in distribution.arcs.iter() {
        let label = escape_xml(&arc.label);
        for d in segment_paths(canvas, arc)? {
            let _ = writeln!(
                body,
                r#"  <path d="{d}" fill="{}" stroke="{SEPARATOR_COLOR}" stroke-width="2"><title>{label}</title></path>"#,
                escape_xml(&arc.color),
            );
        }
    }

    let cx = num(canvas.center_x);
    let cy = num(canvas.center_y);
    let _ = writeln!(
        body,
        r#"  <circle cx="{cx}" cy="{cy}" r="{}" fill="{SEPARATOR_COLOR}"/>"#,
        num(canvas.inner_radius)
    );
    let _ = writeln!(
        body,
        r#"  <text x="{cx}" y="{}" text-anchor="middle" dominant-baseline="middle" font-family="Segoe UI" font-weight="bold" font-size="32" fill="{TOTAL_COLOR}">{}</text>"#,
        num(canvas.center_y - 10.0),
        distribution.center_label()
    );
    let _ = writeln!(
        body,
        r#"  <text x="{cx}" y="{}" text-anchor="middle" dominant-baseline="middle" font-family="Segoe UI" font-size="14" fill="{CAPTION_COLOR}">{}</text>"#,
        num(canvas.center_y + 20.0),
        escape_xml(&distribution.caption)
    );

    Ok(format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" role=\"img\" aria-label=\"Doughnut chart visualization\">\n{body}</svg>\n",
        w = num(canvas.width),
        h = num(canvas.height),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CategoryCounts;
    use crate::chart::{render, ColorScheme};

    fn dist(pairs: &[(&str, usize)]) -> Distribution {
        let counts: CategoryCounts = pairs.iter().map(|(l, c)| (*l, *c)).collect();
        render(&counts, &ColorScheme::default())
    }

    #[test]
    fn draws_one_path_per_segment() {
        let svg = draw(&dist(&[("Open", 2), ("Closed", 1)]), &Canvas::default()).unwrap();
        assert_eq!(svg.matches("<path ").count(), 2);
        assert!(svg.contains(">3</text>"));
        assert!(svg.contains(">Total</text>"));
    }

    #[test]
    fn first_segment_starts_at_top() {
        let svg = draw(&dist(&[("Open", 1), ("Closed", 1)]), &Canvas::default()).unwrap();
        assert!(svg.contains(r#"d="M 200 50 A 150 150 0 0 1 200 350"#));
    }

    #[test]
    fn full_circle_is_split_in_halves() {
        let svg = draw(&dist(&[("Only", 4)]), &Canvas::default()).unwrap();
        assert_eq!(svg.matches("<path ").count(), 2);
    }

    #[test]
    fn empty_distribution_draws_nothing() {
        let svg = draw(&Distribution::empty(), &Canvas::default()).unwrap();
        assert!(svg.is_empty());
    }

    #[test]
    fn bad_geometry_is_an_error() {
        let canvas = Canvas {
            inner_radius: 200.0,
            ..Canvas::default()
        };
        assert!(matches!(
            draw(&dist(&[("a", 1)]), &canvas),
            Err(RenderError::Geometry { .. })
        ));

        let mut broken = dist(&[("a", 1), ("b", 1)]);
        broken.arcs[1].end_angle = f64::NAN;
        assert!(matches!(
            draw(&broken, &Canvas::default()),
            Err(RenderError::NonFiniteAngle { .. })
        ));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = draw(&dist(&[("<b>&", 1)]), &Canvas::default()).unwrap();
        assert!(svg.contains("&lt;b&gt;&amp;"));
    }
}
