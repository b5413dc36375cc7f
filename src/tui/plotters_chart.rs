//! Plotters-powered rotation-curve chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - easy to extend later (legend, annotations, exportable PNG/SVG backends, etc.)
//!
//! We render Plotters output into the Ratatui buffer using
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// The widget is intentionally data-driven: all series and bounds are computed
/// outside the render call. This keeps `render()` focused on drawing and makes
/// it easy to test/benchmark the data prep separately.
pub struct RotPlottersChart<'a> {
    /// Line series for the total rotation curve.
    pub total: &'a [(f64, f64)],
    /// One-sigma confidence band around the total curve (may be empty).
    pub band_hi: &'a [(f64, f64)],
    pub band_lo: &'a [(f64, f64)],
    /// Component curves with their colors (bulge/disk/gas/halo/black hole).
    pub components: &'a [(RGBColor, &'a [(f64, f64)])],
    /// Scatter series for the observed velocities.
    pub points: &'a [(f64, f64)],
    /// X bounds (radius in kpc).
    pub x_bounds: [f64; 2],
    /// Y bounds (velocity in km/s).
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for RotPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a
        // chart. In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite())
            || x1 <= x0
            || y1 <= y0
        {
            return;
        }

        // `plotters-ratatui-backend` draws Plotters primitives via Ratatui's
        // `Canvas` widget, which ultimately writes to the terminal buffer.
        //
        // We delegate rendering to the crate-provided widget helper to avoid
        // coupling our code to its internal backend types.
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // Small margins keep the chart readable without wasting space.
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Axes only; mesh lines are visual clutter at terminal resolution.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.1}"))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // 1) Confidence band first, so everything else draws on top.
            let band_color = RGBColor(0, 110, 110);
            if !self.band_hi.is_empty() && !self.band_lo.is_empty() {
                chart.draw_series(LineSeries::new(self.band_hi.iter().copied(), &band_color))?;
                chart.draw_series(LineSeries::new(self.band_lo.iter().copied(), &band_color))?;
            }

            // 2) Component curves.
            for (color, series) in self.components {
                chart.draw_series(LineSeries::new(series.iter().copied(), color))?;
            }

            // 3) Total curve.
            let total_color = RGBColor(0, 255, 255); // cyan
            chart.draw_series(LineSeries::new(self.total.iter().copied(), &total_color))?;

            // 4) Observed points.
            //
            // We intentionally avoid `Circle` markers here. The underlying
            // `plotters-ratatui-backend` currently maps circle radii
            // incorrectly (pixel radius -> normalized canvas units),
            // producing huge circles. A `Pixel` gives a clean dot that looks
            // good in terminals.
            chart.draw_series(self.points.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
