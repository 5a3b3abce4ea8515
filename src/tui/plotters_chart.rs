//! Plotters-powered segmentation chart widget for Ratatui.
//!
//! Plotters gives us axes and tick labels for free; the output is drawn into
//! the Ratatui buffer through `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only chart description.
///
/// All series and bounds are computed by the caller; `render()` only draws.
pub struct SegmentChart<'a> {
    /// Every point in the model.
    pub points: &'a [(f64, f64)],
    /// Active fitted segments, each from its first to its last covered point.
    pub lines: &'a [[(f64, f64); 2]],
    /// Points of the range currently being scored (a subset of `points`).
    pub candidate: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for SegmentChart<'a> {
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
        let finite = x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite();
        if !finite || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("x")
                .y_desc("y")
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.1}"))
                .y_label_formatter(&|v| format!("{v:.1}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line_color = RGBColor(0, 255, 255); // cyan
            let points_color = WHITE;
            let candidate_color = RGBColor(255, 255, 0); // yellow

            for line in self.lines {
                chart.draw_series(LineSeries::new(line.iter().copied(), &line_color))?;
            }

            // `Circle` radii come out far too large through the backend; pixels read fine.
            chart.draw_series(
                self.points
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), points_color)),
            )?;
            chart.draw_series(
                self.candidate
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), candidate_color)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
