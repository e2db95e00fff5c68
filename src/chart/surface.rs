use crate::analyze::Color;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// A 2D drawing surface. The renderer repaints the full drawing on every
/// call, so the surface only needs to accumulate primitives and serialize
/// them on export.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color, alpha: f64);
    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: Color, stroke_width: f64);
    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color);
    fn ring_slice(
        &mut self,
        cx: f64,
        cy: f64,
        outer: f64,
        inner: f64,
        start_angle: f64,
        end_angle: f64,
        color: Color,
    );
    fn text(&mut self, x: f64, y: f64, content: &str, size: f64, anchor: TextAnchor, color: Color);
    fn encode(&self) -> Vec<u8>;
}

/// Vector surface emitting an SVG document.
pub struct SvgSurface {
    width: u32,
    height: u32,
    elements: Vec<String>,
}

impl SvgSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }
}

impl Surface for SvgSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.elements.clear();
    }

    fn clear(&mut self) {
        self.elements.clear();
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color, alpha: f64) {
        self.elements.push(format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="{width:.1}" height="{height:.1}" fill="{}"/>"#,
            color.rgba(alpha)
        ));
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: Color, stroke_width: f64) {
        if points.len() < 2 {
            return;
        }
        let mut path = String::new();
        for (x, y) in points {
            let _ = write!(path, "{x:.1},{y:.1} ");
        }
        self.elements.push(format!(
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{stroke_width:.1}"/>"#,
            path.trim_end(),
            color.rgba(1.0)
        ));
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color) {
        self.elements.push(format!(
            r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{radius:.1}" fill="{}"/>"#,
            color.rgba(1.0)
        ));
    }

    fn ring_slice(
        &mut self,
        cx: f64,
        cy: f64,
        outer: f64,
        inner: f64,
        start_angle: f64,
        end_angle: f64,
        color: Color,
    ) {
        let point = |angle: f64, radius: f64| {
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        };
        let large = if end_angle - start_angle > std::f64::consts::PI {
            1
        } else {
            0
        };
        let (x0, y0) = point(start_angle, outer);
        let (x1, y1) = point(end_angle, outer);
        let (x2, y2) = point(end_angle, inner);
        let (x3, y3) = point(start_angle, inner);
        self.elements.push(format!(
            r#"<path d="M {x0:.1} {y0:.1} A {outer:.1} {outer:.1} 0 {large} 1 {x1:.1} {y1:.1} L {x2:.1} {y2:.1} A {inner:.1} {inner:.1} 0 {large} 0 {x3:.1} {y3:.1} Z" fill="{}"/>"#,
            color.rgba(0.85)
        ));
    }

    fn text(&mut self, x: f64, y: f64, content: &str, size: f64, anchor: TextAnchor, color: Color) {
        self.elements.push(format!(
            r#"<text x="{x:.1}" y="{y:.1}" font-size="{size:.0}" font-family="sans-serif" text-anchor="{}" fill="{}">{}</text>"#,
            anchor.as_str(),
            color.rgba(1.0),
            xml_escape(content)
        ));
    }

    fn encode(&self) -> Vec<u8> {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{0}" height="{1}" viewBox="0 0 {0} {1}">"#,
            self.width, self.height
        );
        let _ = write!(
            svg,
            r#"<rect width="{}" height="{}" fill="white"/>"#,
            self.width, self.height
        );
        for element in &self.elements {
            svg.push_str(element);
        }
        svg.push_str("</svg>");
        svg.into_bytes()
    }
}

fn xml_escape(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wraps_elements_in_an_svg_document() {
        let mut surface = SvgSurface::new(320, 200);
        surface.fill_rect(10.0, 10.0, 50.0, 20.0, Color::BLUE, 0.7);
        surface.text(5.0, 5.0, "a < b", 10.0, TextAnchor::Start, Color::RED);

        let svg = String::from_utf8(surface.encode()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="320""#));
        assert!(svg.contains("rgba(59,130,246,0.7)"));
        assert!(svg.contains("a &lt; b"));
    }

    #[test]
    fn clear_and_resize_drop_previous_elements() {
        let mut surface = SvgSurface::new(320, 200);
        surface.fill_circle(1.0, 1.0, 3.0, Color::GREEN);
        surface.resize(100, 80);

        let svg = String::from_utf8(surface.encode()).unwrap();
        assert!(!svg.contains("<circle"));
        assert!(svg.contains(r#"width="100""#));
    }

    #[test]
    fn degenerate_polylines_are_skipped() {
        let mut surface = SvgSurface::new(100, 100);
        surface.stroke_polyline(&[(1.0, 1.0)], Color::BLUE, 2.0);
        let svg = String::from_utf8(surface.encode()).unwrap();
        assert!(!svg.contains("<polyline"));
    }
}
