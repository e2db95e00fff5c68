use crate::analyze::{ChartData, Color, SIZE_BUCKET_COLORS};
use crate::chart::{Surface, TextAnchor};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

const MARGIN_LEFT: f64 = 46.0;
const MARGIN_RIGHT: f64 = 14.0;
const MARGIN_TOP: f64 = 26.0;
const MARGIN_BOTTOM: f64 = 30.0;
const AXIS_COLOR: Color = Color::new(107, 114, 128);
const PLACEHOLDER_FILL: Color = Color::new(229, 231, 235);
const LABEL_SIZE: f64 = 10.0;
const MARKER_RADIUS: f64 = 3.0;
const BAR_GROUP_SHARE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartType {
    Bar,
    Line,
    Doughnut,
    /// Anything else renders as a placeholder instead of failing.
    Other(String),
}

impl From<&str> for ChartType {
    fn from(kind: &str) -> Self {
        match kind {
            "bar" => ChartType::Bar,
            "line" => ChartType::Line,
            "doughnut" => ChartType::Doughnut,
            other => ChartType::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChartOptions {
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub legend: bool,
    pub begin_at_zero: bool,
    pub y_max: Option<f64>,
}

/// One live visualization: a declarative description plus the surface it is
/// painted on. There is no retained scene graph; every change repaints the
/// whole drawing.
pub struct ChartHandle {
    chart_type: ChartType,
    data: ChartData,
    options: ChartOptions,
    surface: Box<dyn Surface>,
}

impl ChartHandle {
    /// Clears the surface and draws immediately.
    pub fn create(
        surface: Box<dyn Surface>,
        chart_type: ChartType,
        data: ChartData,
        options: ChartOptions,
    ) -> Self {
        let mut handle = Self {
            chart_type,
            data,
            options,
            surface,
        };
        handle.redraw();
        handle
    }

    /// Replace the dataset; callers follow up with `redraw`.
    pub fn set_data(&mut self, data: ChartData) {
        self.data = data;
    }

    pub fn data(&self) -> &ChartData {
        &self.data
    }

    pub fn redraw(&mut self) {
        let Self {
            chart_type,
            data,
            options,
            surface,
        } = self;
        let surface = &mut **surface;
        surface.clear();
        match chart_type {
            ChartType::Bar => draw_bar(surface, data, options),
            ChartType::Line => draw_line(surface, data, options),
            ChartType::Doughnut => draw_doughnut(surface, data),
            ChartType::Other(kind) => draw_placeholder(surface, kind),
        }
    }

    /// Re-fit to new surface dimensions and repaint.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
        self.redraw();
    }

    pub fn export_image(&self) -> Vec<u8> {
        self.surface.encode()
    }

    /// The surface has no persistent resources; dropping the handle is the
    /// whole teardown.
    pub fn destroy(self) {}
}

#[derive(Debug, Clone, Copy)]
struct Plot {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

fn plot_area(surface: &dyn Surface) -> Plot {
    Plot {
        x: MARGIN_LEFT,
        y: MARGIN_TOP,
        w: (surface.width() as f64 - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
        h: (surface.height() as f64 - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
    }
}

fn y_scale(plot: Plot, min: f64, max: f64) -> impl Fn(f64) -> f64 {
    move |value| plot.y + (max - value) / (max - min) * plot.h
}

fn draw_bar(surface: &mut dyn Surface, data: &ChartData, options: &ChartOptions) {
    let plot = plot_area(surface);
    let values = data
        .series
        .iter()
        .flat_map(|series| series.points.iter().flatten().copied())
        .collect::<Vec<_>>();

    let mut min = values.iter().copied().fold(0.0_f64, f64::min);
    let mut max = values.iter().copied().fold(0.0_f64, f64::max);
    if let Some(cap) = options.y_max {
        max = cap;
    }
    if max - min < f64::EPSILON {
        max = min + 1.0;
    }
    let y_of = y_scale(plot, min, max);

    draw_frame(surface, plot, min, max, options);
    draw_x_labels(surface, plot, &data.labels, true);

    let slots = data.labels.len().max(1);
    let slot_w = plot.w / slots as f64;
    let group_w = slot_w * BAR_GROUP_SHARE;
    let bar_w = group_w / data.series.len().max(1) as f64;
    let zero_y = y_of(0.0);

    for (series_index, series) in data.series.iter().enumerate() {
        for (i, point) in series.points.iter().enumerate() {
            let Some(value) = point else {
                continue;
            };
            let x = plot.x
                + i as f64 * slot_w
                + slot_w * (1.0 - BAR_GROUP_SHARE) / 2.0
                + series_index as f64 * bar_w;
            let value_y = y_of(*value);
            let top = value_y.min(zero_y);
            let height = (value_y - zero_y).abs();
            surface.fill_rect(x, top, bar_w, height, series.color, 0.7);
        }
    }

    if min < 0.0 {
        surface.stroke_polyline(&[(plot.x, zero_y), (plot.x + plot.w, zero_y)], AXIS_COLOR, 0.5);
    }
    if options.legend {
        draw_legend(surface, data, plot);
    }
}

fn draw_line(surface: &mut dyn Surface, data: &ChartData, options: &ChartOptions) {
    let plot = plot_area(surface);
    // Nulls stay out of the domain as well as the path.
    let values = data
        .series
        .iter()
        .flat_map(|series| series.points.iter().flatten().copied())
        .collect::<Vec<_>>();

    let (mut min, mut max) = if values.is_empty() {
        (0.0, 1.0)
    } else {
        values.iter().fold((f64::MAX, f64::MIN), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        })
    };
    if options.begin_at_zero {
        min = min.min(0.0);
    }
    if let Some(cap) = options.y_max {
        max = cap;
    }
    if max - min < f64::EPSILON {
        max = min + 1.0;
    }
    let y_of = y_scale(plot, min, max);

    draw_frame(surface, plot, min, max, options);
    draw_x_labels(surface, plot, &data.labels, false);

    let n = data.labels.len().max(1);
    let x_of = |index: usize| {
        if n > 1 {
            plot.x + plot.w * index as f64 / (n - 1) as f64
        } else {
            plot.x + plot.w / 2.0
        }
    };

    for series in &data.series {
        let mut run: Vec<(f64, f64)> = Vec::new();
        for (i, point) in series.points.iter().enumerate() {
            match point {
                Some(value) => run.push((x_of(i), y_of(*value))),
                None => {
                    surface.stroke_polyline(&run, series.color, 2.0);
                    run.clear();
                }
            }
        }
        surface.stroke_polyline(&run, series.color, 2.0);

        for (i, point) in series.points.iter().enumerate() {
            if let Some(value) = point {
                surface.fill_circle(x_of(i), y_of(*value), MARKER_RADIUS, series.color);
            }
        }
    }

    if options.legend {
        draw_legend(surface, data, plot);
    }
}

fn draw_doughnut(surface: &mut dyn Surface, data: &ChartData) {
    let Some(series) = data.series.first() else {
        return;
    };
    let values = series
        .points
        .iter()
        .map(|point| point.unwrap_or(0.0).max(0.0))
        .collect::<Vec<_>>();
    let total: f64 = values.iter().sum();

    let width = surface.width() as f64;
    let height = surface.height() as f64;
    let outer = ((width - 40.0).min(height - 56.0) / 2.0).max(10.0);
    let inner = outer * 0.6;
    let cx = width / 2.0;
    let cy = 12.0 + outer;

    if total > 0.0 {
        // Clockwise from the top.
        let mut angle = -FRAC_PI_2;
        for (i, value) in values.iter().enumerate() {
            if *value <= 0.0 {
                continue;
            }
            let span = value / total * TAU;
            let color = slice_color(i);
            if span >= TAU - 1e-9 {
                // A single full-circle arc collapses in SVG; draw two halves.
                surface.ring_slice(cx, cy, outer, inner, angle, angle + PI, color);
                surface.ring_slice(cx, cy, outer, inner, angle + PI, angle + TAU, color);
            } else {
                surface.ring_slice(cx, cy, outer, inner, angle, angle + span, color);
            }
            angle += span;
        }
    }

    let entries = data
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), slice_color(i)))
        .collect::<Vec<_>>();
    let total_width: f64 = entries.iter().map(|(label, _)| legend_width(label)).sum();
    let mut x = (width - total_width) / 2.0;
    let y = height - 10.0;
    for (label, color) in entries {
        surface.fill_rect(x, y - 8.0, 9.0, 9.0, color, 1.0);
        surface.text(x + 13.0, y, label, LABEL_SIZE, TextAnchor::Start, AXIS_COLOR);
        x += legend_width(label);
    }
}

fn draw_placeholder(surface: &mut dyn Surface, kind: &str) {
    let width = surface.width() as f64;
    let height = surface.height() as f64;
    surface.fill_rect(0.0, 0.0, width, height, PLACEHOLDER_FILL, 1.0);
    surface.text(
        width / 2.0,
        height / 2.0,
        &format!("unsupported chart: {kind}"),
        12.0,
        TextAnchor::Middle,
        AXIS_COLOR,
    );
}

fn draw_frame(surface: &mut dyn Surface, plot: Plot, min: f64, max: f64, options: &ChartOptions) {
    surface.stroke_polyline(
        &[(plot.x, plot.y), (plot.x, plot.y + plot.h)],
        AXIS_COLOR,
        1.0,
    );
    surface.stroke_polyline(
        &[(plot.x, plot.y + plot.h), (plot.x + plot.w, plot.y + plot.h)],
        AXIS_COLOR,
        1.0,
    );
    surface.text(
        plot.x - 4.0,
        plot.y + 4.0,
        &fmt_tick(max),
        LABEL_SIZE,
        TextAnchor::End,
        AXIS_COLOR,
    );
    surface.text(
        plot.x - 4.0,
        plot.y + plot.h,
        &fmt_tick(min),
        LABEL_SIZE,
        TextAnchor::End,
        AXIS_COLOR,
    );
    if let Some(label) = &options.y_label {
        surface.text(plot.x, 12.0, label, LABEL_SIZE, TextAnchor::Start, AXIS_COLOR);
    }
    if let Some(label) = &options.x_label {
        surface.text(
            plot.x + plot.w / 2.0,
            plot.y + plot.h + 26.0,
            label,
            LABEL_SIZE,
            TextAnchor::Middle,
            AXIS_COLOR,
        );
    }
}

fn draw_x_labels(surface: &mut dyn Surface, plot: Plot, labels: &[String], centered: bool) {
    if labels.is_empty() {
        return;
    }
    let n = labels.len();
    let step = (n + 7) / 8;
    for (i, label) in labels.iter().enumerate().step_by(step.max(1)) {
        let x = if centered {
            plot.x + (i as f64 + 0.5) * plot.w / n as f64
        } else if n > 1 {
            plot.x + plot.w * i as f64 / (n - 1) as f64
        } else {
            plot.x + plot.w / 2.0
        };
        surface.text(
            x,
            plot.y + plot.h + 14.0,
            label,
            LABEL_SIZE,
            TextAnchor::Middle,
            AXIS_COLOR,
        );
    }
}

fn draw_legend(surface: &mut dyn Surface, data: &ChartData, plot: Plot) {
    let total: f64 = data
        .series
        .iter()
        .map(|series| legend_width(&series.label))
        .sum();
    let mut x = plot.x + plot.w - total;
    let y = 12.0;
    for series in &data.series {
        surface.fill_rect(x, y - 8.0, 9.0, 9.0, series.color, 1.0);
        surface.text(
            x + 13.0,
            y,
            &series.label,
            LABEL_SIZE,
            TextAnchor::Start,
            AXIS_COLOR,
        );
        x += legend_width(&series.label);
    }
}

fn slice_color(index: usize) -> Color {
    SIZE_BUCKET_COLORS[index % SIZE_BUCKET_COLORS.len()]
}

fn legend_width(label: &str) -> f64 {
    label.len() as f64 * 6.0 + 22.0
}

fn fmt_tick(value: f64) -> String {
    if value == value.trunc() {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::Series;
    use crate::chart::SvgSurface;

    fn svg_of(handle: &ChartHandle) -> String {
        String::from_utf8(handle.export_image()).unwrap()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    fn bar_data() -> ChartData {
        ChartData {
            labels: vec!["Jun 01".into(), "Jun 02".into(), "Jun 03".into()],
            series: vec![
                Series::new("api", vec![Some(3.0), Some(2.0), Some(0.0)], Color::GREEN),
                Series::new("web", vec![Some(1.0), Some(0.0), Some(5.0)], Color::RED),
            ],
        }
    }

    #[test]
    fn bar_chart_draws_one_bar_per_value() {
        let handle = ChartHandle::create(
            Box::new(SvgSurface::new(640, 320)),
            ChartType::Bar,
            bar_data(),
            ChartOptions::default(),
        );
        let svg = svg_of(&handle);
        // Bars use 0.7 alpha; the legend squares use 1.0.
        assert_eq!(count(&svg, "rgba(34,197,94,0.7)"), 3);
        assert_eq!(count(&svg, "rgba(239,68,68,0.7)"), 3);
    }

    #[test]
    fn negative_bars_add_a_zero_line() {
        let data = ChartData {
            labels: vec!["a".into(), "b".into()],
            series: vec![Series::new("net", vec![Some(5.0), Some(-5.0)], Color::BLUE)],
        };
        let handle = ChartHandle::create(
            Box::new(SvgSurface::new(640, 320)),
            ChartType::Bar,
            data,
            ChartOptions::default(),
        );
        // Two axis lines plus the zero line.
        assert_eq!(count(&svg_of(&handle), "<polyline"), 3);
    }

    #[test]
    fn line_chart_gaps_null_points() {
        let data = ChartData {
            labels: (1..=4).map(|i| format!("d{i}")).collect(),
            series: vec![Series::new(
                "v",
                vec![Some(1.0), Some(2.0), None, Some(3.0)],
                Color::BLUE,
            )],
        };
        let handle = ChartHandle::create(
            Box::new(SvgSurface::new(640, 320)),
            ChartType::Line,
            data,
            ChartOptions::default(),
        );
        let svg = svg_of(&handle);
        // One marker per non-null point.
        assert_eq!(count(&svg, "<circle"), 3);
        // Two axis lines plus a single two-point run; the trailing
        // single-point run is dropped by the surface.
        assert_eq!(count(&svg, "<polyline"), 3);
    }

    #[test]
    fn all_null_line_series_draw_only_the_frame() {
        let data = ChartData {
            labels: vec!["a".into(), "b".into()],
            series: vec![Series::new("v", vec![None, None], Color::BLUE)],
        };
        let handle = ChartHandle::create(
            Box::new(SvgSurface::new(640, 320)),
            ChartType::Line,
            data,
            ChartOptions::default(),
        );
        let svg = svg_of(&handle);
        assert_eq!(count(&svg, "<circle"), 0);
        assert_eq!(count(&svg, "<polyline"), 2);
    }

    fn doughnut_data(values: Vec<Option<f64>>) -> ChartData {
        ChartData {
            labels: (0..values.len()).map(|i| format!("b{i}")).collect(),
            series: vec![Series::new("sizes", values, Color::GREEN)],
        }
    }

    #[test]
    fn doughnut_skips_zero_slices() {
        let handle = ChartHandle::create(
            Box::new(SvgSurface::new(320, 320)),
            ChartType::Doughnut,
            doughnut_data(vec![Some(2.0), Some(0.0), Some(3.0)]),
            ChartOptions::default(),
        );
        assert_eq!(count(&svg_of(&handle), "<path"), 2);
    }

    #[test]
    fn single_value_doughnut_closes_the_ring() {
        let handle = ChartHandle::create(
            Box::new(SvgSurface::new(320, 320)),
            ChartType::Doughnut,
            doughnut_data(vec![Some(7.0)]),
            ChartOptions::default(),
        );
        assert_eq!(count(&svg_of(&handle), "<path"), 2);
    }

    #[test]
    fn all_zero_doughnut_draws_no_slices() {
        let handle = ChartHandle::create(
            Box::new(SvgSurface::new(320, 320)),
            ChartType::Doughnut,
            doughnut_data(vec![Some(0.0), Some(0.0)]),
            ChartOptions::default(),
        );
        assert_eq!(count(&svg_of(&handle), "<path"), 0);
    }

    #[test]
    fn unrecognized_kinds_fall_back_to_a_placeholder() {
        assert_eq!(ChartType::from("bar"), ChartType::Bar);
        let handle = ChartHandle::create(
            Box::new(SvgSurface::new(320, 160)),
            ChartType::from("radar"),
            bar_data(),
            ChartOptions::default(),
        );
        assert!(svg_of(&handle).contains("unsupported chart: radar"));
    }

    #[test]
    fn resize_refits_and_repaints() {
        let mut handle = ChartHandle::create(
            Box::new(SvgSurface::new(640, 320)),
            ChartType::Bar,
            bar_data(),
            ChartOptions::default(),
        );
        handle.resize(500, 250);
        let svg = svg_of(&handle);
        assert!(svg.contains(r#"width="500""#));
        assert_eq!(count(&svg, "rgba(34,197,94,0.7)"), 3);
    }

    #[test]
    fn export_produces_an_svg_document() {
        let handle = ChartHandle::create(
            Box::new(SvgSurface::new(640, 320)),
            ChartType::Line,
            bar_data(),
            ChartOptions::default(),
        );
        assert!(handle.export_image().starts_with(b"<svg"));
    }
}
