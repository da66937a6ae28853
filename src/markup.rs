//! Markup serializer: turns a scene tree into a self-contained HTML document
//!
//! The vector layout below is deliberately modest (band/linear scales, five
//! y ticks, one series). The pipeline only depends on the document being
//! self-contained, sized to the target raster, and drawn on a white
//! background; everything else is presentation.

use crate::scene::{NodeKind, Orientation, SceneNode};
use crate::spec::{ChartKind, Coord, Point};
use crate::Viewport;

const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 56.0;

const AXIS_COLOR: &str = "#607d8b";
const SERIES_COLOR: &str = "#4a7ebb";
const REFERENCE_COLOR: &str = "#c43a31";
const TEXT_COLOR: &str = "#333333";

/// Wrap the rendered scene into a complete HTML page.
///
/// The page carries a fixed white background and explicit pixel dimensions
/// matching the target raster size, so a capture of the loaded page is the
/// chart and nothing else.
pub fn document(scene: &SceneNode, viewport: Viewport) -> String {
    let svg = render_svg(scene, viewport);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n\
         html, body {{ margin: 0; padding: 0; background: #ffffff; }}\n\
         #chart {{ width: {w}px; height: {h}px; }}\n\
         </style>\n</head>\n<body>\n<div id=\"chart\">\n{svg}\n</div>\n</body>\n</html>\n",
        w = viewport.width,
        h = viewport.height,
    )
}

/// Render the scene as standalone SVG markup sized to the viewport.
pub fn render_svg(scene: &SceneNode, viewport: Viewport) -> String {
    let width = f64::from(viewport.width);
    let height = f64::from(viewport.height);
    let left = MARGIN_LEFT;
    let right = width - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = height - MARGIN_BOTTOM;

    let mut xlabel = "";
    let mut ylabel = "";
    let mut title = "";
    let mut series: Option<(ChartKind, &[Point])> = None;
    let mut reference_lines: Vec<(f64, &str)> = Vec::new();

    for child in &scene.children {
        match &child.kind {
            NodeKind::Axis {
                orient: Orientation::Horizontal,
                label,
            } => xlabel = label,
            NodeKind::Axis {
                orient: Orientation::Vertical,
                label,
            } => ylabel = label,
            NodeKind::Series { kind, points } => series = Some((*kind, points)),
            NodeKind::Title { text } => title = text,
            NodeKind::ReferenceLine { value, label } => reference_lines.push((*value, label)),
            NodeKind::Chart => {}
        }
    }

    let mut out = String::with_capacity(2048);
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\" font-family=\"sans-serif\">\n"
    ));
    out.push_str(&format!(
        "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"#ffffff\"/>\n"
    ));

    if let Some((kind, points)) = series {
        let xs = x_positions(points, left, right);
        let y_scale = YScale::fit(points, &reference_lines, top, bottom);

        draw_frame(&mut out, left, right, top, bottom, &y_scale);
        draw_x_ticks(&mut out, points, &xs, bottom);
        draw_series(&mut out, kind, points, &xs, &y_scale, left, right);
        for (value, label) in &reference_lines {
            draw_reference_line(&mut out, *value, label, &y_scale, left, right);
        }
    }

    // Captions occupy fixed layout slots regardless of the data
    out.push_str(&format!(
        "<text x=\"{x}\" y=\"28\" text-anchor=\"middle\" font-size=\"16\" fill=\"{TEXT_COLOR}\">{}</text>\n",
        escape_xml(title),
        x = width / 2.0,
    ));
    out.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" font-size=\"12\" fill=\"{TEXT_COLOR}\">{}</text>\n",
        escape_xml(xlabel),
        x = (left + right) / 2.0,
        y = height - 12.0,
    ));
    out.push_str(&format!(
        "<text x=\"16\" y=\"{y}\" text-anchor=\"middle\" font-size=\"12\" fill=\"{TEXT_COLOR}\" \
         transform=\"rotate(-90 16 {y})\">{}</text>\n",
        escape_xml(ylabel),
        y = (top + bottom) / 2.0,
    ));

    out.push_str("</svg>");
    out
}

/// Linear y scale covering the data, zero, and all reference line values.
struct YScale {
    min: f64,
    max: f64,
    top: f64,
    bottom: f64,
}

impl YScale {
    fn fit(points: &[Point], reference_lines: &[(f64, &str)], top: f64, bottom: f64) -> Self {
        let mut min: f64 = 0.0;
        let mut max = f64::MIN;
        for p in points {
            min = min.min(p.y);
            max = max.max(p.y);
        }
        for (value, _) in reference_lines {
            min = min.min(*value);
            max = max.max(*value);
        }
        if !(max > min) {
            max = min + 1.0;
        }
        // 5% headroom keeps the tallest element off the frame edge
        max += (max - min) * 0.05;
        Self {
            min,
            max,
            top,
            bottom,
        }
    }

    fn project(&self, value: f64) -> f64 {
        self.bottom - (value - self.min) / (self.max - self.min) * (self.bottom - self.top)
    }
}

/// Horizontal positions aligned with the points: a linear scale when every x
/// is numeric, otherwise a band scale in point order.
fn x_positions(points: &[Point], left: f64, right: f64) -> Vec<f64> {
    let numeric: Option<Vec<f64>> = points
        .iter()
        .map(|p| match p.x {
            Coord::Number(n) => Some(n),
            Coord::Label(_) => None,
        })
        .collect();

    match numeric {
        Some(xs) => {
            let min = xs.iter().cloned().fold(f64::MAX, f64::min);
            let max = xs.iter().cloned().fold(f64::MIN, f64::max);
            if !(max > min) {
                return vec![(left + right) / 2.0; points.len()];
            }
            xs.iter()
                .map(|x| left + (x - min) / (max - min) * (right - left))
                .collect()
        }
        None => {
            let n = points.len() as f64;
            (0..points.len())
                .map(|i| left + (i as f64 + 0.5) * (right - left) / n)
                .collect()
        }
    }
}

fn draw_frame(out: &mut String, left: f64, right: f64, top: f64, bottom: f64, y_scale: &YScale) {
    out.push_str(&format!(
        "<line x1=\"{left}\" y1=\"{bottom}\" x2=\"{right}\" y2=\"{bottom}\" stroke=\"{AXIS_COLOR}\"/>\n"
    ));
    out.push_str(&format!(
        "<line x1=\"{left}\" y1=\"{top}\" x2=\"{left}\" y2=\"{bottom}\" stroke=\"{AXIS_COLOR}\"/>\n"
    ));

    for i in 0..5 {
        let value = y_scale.min + (y_scale.max - y_scale.min) * f64::from(i) / 4.0;
        let y = y_scale.project(value);
        out.push_str(&format!(
            "<line x1=\"{x1}\" y1=\"{y}\" x2=\"{left}\" y2=\"{y}\" stroke=\"{AXIS_COLOR}\"/>\n",
            x1 = left - 5.0,
        ));
        out.push_str(&format!(
            "<text x=\"{x}\" y=\"{ty}\" text-anchor=\"end\" font-size=\"10\" fill=\"{TEXT_COLOR}\">{}</text>\n",
            format_value(value),
            x = left - 8.0,
            ty = y + 3.0,
        ));
    }
}

fn draw_x_ticks(out: &mut String, points: &[Point], xs: &[f64], bottom: f64) {
    for (point, x) in points.iter().zip(xs) {
        out.push_str(&format!(
            "<line x1=\"{x}\" y1=\"{bottom}\" x2=\"{x}\" y2=\"{y2}\" stroke=\"{AXIS_COLOR}\"/>\n",
            y2 = bottom + 5.0,
        ));
        out.push_str(&format!(
            "<text x=\"{x}\" y=\"{ty}\" text-anchor=\"middle\" font-size=\"10\" fill=\"{TEXT_COLOR}\">{}</text>\n",
            escape_xml(&point.x.to_string()),
            ty = bottom + 18.0,
        ));
    }
}

fn draw_series(
    out: &mut String,
    kind: ChartKind,
    points: &[Point],
    xs: &[f64],
    y_scale: &YScale,
    left: f64,
    right: f64,
) {
    match kind {
        ChartKind::Bar => {
            let band = (right - left) / points.len() as f64;
            let bar_width = (band * 0.6).max(1.0);
            let baseline = y_scale.project(0.0f64.clamp(y_scale.min, y_scale.max));
            for (point, x) in points.iter().zip(xs) {
                let y = y_scale.project(point.y);
                let (rect_y, rect_h) = if y <= baseline {
                    (y, baseline - y)
                } else {
                    (baseline, y - baseline)
                };
                out.push_str(&format!(
                    "<rect x=\"{rx}\" y=\"{rect_y}\" width=\"{bar_width}\" height=\"{rect_h}\" fill=\"{SERIES_COLOR}\"/>\n",
                    rx = x - bar_width / 2.0,
                ));
            }
        }
        ChartKind::Line => {
            let coords: Vec<String> = points
                .iter()
                .zip(xs)
                .map(|(p, x)| format!("{x},{y}", y = y_scale.project(p.y)))
                .collect();
            out.push_str(&format!(
                "<polyline points=\"{}\" fill=\"none\" stroke=\"{SERIES_COLOR}\" stroke-width=\"2\"/>\n",
                coords.join(" "),
            ));
            for (point, x) in points.iter().zip(xs) {
                out.push_str(&format!(
                    "<circle cx=\"{x}\" cy=\"{cy}\" r=\"3\" fill=\"{SERIES_COLOR}\"/>\n",
                    cy = y_scale.project(point.y),
                ));
            }
        }
        ChartKind::Scatter => {
            for (point, x) in points.iter().zip(xs) {
                out.push_str(&format!(
                    "<circle cx=\"{x}\" cy=\"{cy}\" r=\"5\" fill=\"{SERIES_COLOR}\"/>\n",
                    cy = y_scale.project(point.y),
                ));
            }
        }
    }
}

fn draw_reference_line(
    out: &mut String,
    value: f64,
    label: &str,
    y_scale: &YScale,
    left: f64,
    right: f64,
) {
    let y = y_scale.project(value);
    out.push_str(&format!(
        "<line x1=\"{left}\" y1=\"{y}\" x2=\"{right}\" y2=\"{y}\" stroke=\"{REFERENCE_COLOR}\" \
         stroke-dasharray=\"6 4\"/>\n"
    ));
    out.push_str(&format!(
        "<text x=\"{right}\" y=\"{ty}\" text-anchor=\"end\" font-size=\"10\" fill=\"{REFERENCE_COLOR}\">{}</text>\n",
        escape_xml(label),
        ty = y - 4.0,
    ));
}

fn format_value(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.2}")
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::build;
    use crate::spec::{normalize, ChartRequest};
    use serde_json::json;

    fn svg_for(body: serde_json::Value) -> String {
        let req: ChartRequest = serde_json::from_value(body).expect("request");
        let spec = normalize(&req).expect("valid request");
        render_svg(&build(&spec), Viewport::default())
    }

    #[test]
    fn bar_series_uses_rects() {
        let svg = svg_for(json!({
            "type": "bar",
            "data": [{"x": "A", "y": 25}, {"x": "B", "y": 18}],
        }));
        assert_eq!(svg.matches("<rect").count(), 3); // background + 2 bars
    }

    #[test]
    fn line_series_uses_polyline() {
        let svg = svg_for(json!({
            "type": "line",
            "data": [{"x": 1, "y": 2}, {"x": 2, "y": 3}],
        }));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn scatter_series_uses_circles() {
        let svg = svg_for(json!({
            "type": "scatter",
            "data": [{"x": 1, "y": 2}, {"x": 2, "y": 1}, {"x": 3, "y": 4}],
        }));
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn reference_lines_render_dashed_with_labels() {
        let svg = svg_for(json!({
            "type": "bar",
            "data": [{"x": "LDL", "y": 110}],
            "referenceLines": {"Optimal": 100},
        }));
        assert_eq!(svg.matches("stroke-dasharray").count(), 1);
        assert!(svg.contains(">Optimal</text>"));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = svg_for(json!({
            "type": "bar",
            "data": [{"x": "a<b", "y": 1}],
            "title": "Tom & Jerry",
        }));
        assert!(svg.contains("Tom &amp; Jerry"));
        assert!(svg.contains("a&lt;b"));
        assert!(!svg.contains("Tom & Jerry<"));
    }

    #[test]
    fn document_is_self_contained_with_white_background() {
        let req: ChartRequest =
            serde_json::from_value(json!({"type": "line", "data": [{"x": 1, "y": 2}]}))
                .expect("request");
        let spec = normalize(&req).expect("valid request");
        let viewport = Viewport {
            width: 640,
            height: 480,
        };
        let html = document(&build(&spec), viewport);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("background: #ffffff"));
        assert!(html.contains("width: 640px"));
        assert!(html.contains("height: 480px"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn single_point_does_not_divide_by_zero() {
        let svg = svg_for(json!({"type": "scatter", "data": [{"x": 5, "y": 5}]}));
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }
}
