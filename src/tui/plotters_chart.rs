//! Plotters-powered anomaly chart widget for Ratatui.
//!
//! Plotters gives us axis + mesh rendering and easy primitives (error bars are
//! plain vertical paths) on top of the Ratatui buffer via
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Curve line color (cyan); the legend in the surrounding block uses the same.
pub const CURVE_RGB: (u8, u8, u8) = (0, 255, 255);
/// Data point and error bar color.
pub const POINT_RGB: (u8, u8, u8) = (255, 255, 255);

/// A render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct AnomalyChart<'a> {
    /// Fitted curve, densely sampled.
    pub curve: &'a [(f64, f64)],
    /// Observed points.
    pub points: &'a [(f64, f64)],
    /// Half-height of the error bar drawn on every point.
    pub error: f64,
    /// X bounds (decimal years).
    pub x_bounds: [f64; 2],
    /// Y bounds (°C).
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl Widget for AnomalyChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let curve_color = RGBColor(CURVE_RGB.0, CURVE_RGB.1, CURVE_RGB.2);
            let point_color = RGBColor(POINT_RGB.0, POINT_RGB.1, POINT_RGB.2);

            chart.draw_series(LineSeries::new(self.curve.iter().copied(), &curve_color))?;

            if self.error.is_finite() && self.error > 0.0 {
                let e = self.error;
                chart.draw_series(
                    self.points
                        .iter()
                        .map(|&(x, y)| PathElement::new(vec![(x, y - e), (x, y + e)], point_color)),
                )?;
            }

            // `Circle` radii are mis-scaled by the ratatui backend; a pixel renders as a clean dot.
            chart.draw_series(self.points.iter().map(|&(x, y)| Pixel::new((x, y), point_color)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
