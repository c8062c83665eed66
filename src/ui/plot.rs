use eframe::egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotBounds, PlotPoints};

use crate::data::model::LabeledArray;
use crate::range::RangeSynchronizer;

// ---------------------------------------------------------------------------
// Line plot (central panel)
// ---------------------------------------------------------------------------

/// Owned handle to the plotting area.
///
/// Bounds always come from the [`RangeSynchronizer`]; mouse navigation on
/// the plot itself is disabled so the range widgets stay authoritative.
pub struct PlotSurface {
    id: &'static str,
    color: Color32,
    width: f32,
}

impl Default for PlotSurface {
    fn default() -> Self {
        Self {
            id: "array_plot",
            color: Color32::LIGHT_BLUE,
            width: 1.5,
        }
    }
}

impl PlotSurface {
    /// Draw the array against the selected coordinate, clipped to the
    /// current ranges.
    pub fn show(&self, ui: &mut Ui, array: &LabeledArray, ranges: &RangeSynchronizer) {
        let coord_name = ranges.selected_coord();
        let Some(coord) = array.coord(coord_name) else {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading(format!("No coordinate named '{coord_name}'"));
            });
            return;
        };

        let (x0, x1) = ranges.x_bounds();
        let (y0, y1) = ranges.y_bounds();
        let series = array.name().unwrap_or("value");

        ui.vertical_centered(|ui: &mut Ui| {
            ui.heading("Data");
        });

        Plot::new(self.id)
            .x_axis_label(axis_label(coord_name, coord.units()))
            .y_axis_label(axis_label(series, array.units()))
            .allow_boxed_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .allow_zoom(false)
            .allow_double_click_reset(false)
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max([x0, y0], [x1, y1]));
                for segment in line_segments(&coord.values, array.data()) {
                    let points: PlotPoints = segment.into_iter().collect();
                    let line = Line::new(points)
                        .name(series)
                        .color(self.color)
                        .width(self.width);
                    plot_ui.line(line);
                }
            });
    }
}

/// `name [units]`, or just `name`.
pub fn axis_label(name: &str, units: Option<&str>) -> String {
    match units {
        Some(u) if !u.is_empty() => format!("{name} [{u}]"),
        _ => name.to_string(),
    }
}

/// Split (x, y) pairs into runs of finite points; a NaN on either axis
/// leaves a gap in the line.
pub fn line_segments(xs: &[f64], ys: &[f64]) -> Vec<Vec<[f64; 2]>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (&x, &y) in xs.iter().zip(ys) {
        if x.is_finite() && y.is_finite() {
            current.push([x, y]);
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}
