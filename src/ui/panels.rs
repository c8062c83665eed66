use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::range::{PERCENT_MAX, RangeEvent};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Range controls – y spin boxes and x sliders
// ---------------------------------------------------------------------------

/// Render the y spin boxes and x sliders. Edits are queued on the state
/// and applied before the plot is drawn.
pub fn range_controls(ui: &mut Ui, state: &mut AppState) {
    let ranges = &state.ranges;
    let (mut ymin, mut ymax) = ranges.y_bounds();
    let (lo, hi) = ranges.y_limits();
    let step = ranges.y_step();
    let (mut p_low, mut p_high) = ranges.x_percentages();

    let mut events = Vec::new();

    ui.horizontal(|ui: &mut Ui| {
        ui.label("ymin: ");
        let min_changed = ui
            .add(egui::DragValue::new(&mut ymin).speed(step).range(lo..=hi))
            .changed();
        ui.label("ymax: ");
        let max_changed = ui
            .add(egui::DragValue::new(&mut ymax).speed(step).range(lo..=hi))
            .changed();
        if min_changed || max_changed {
            events.push(RangeEvent::YBounds {
                min: ymin,
                max: ymax,
            });
        }
        if ui.button("reset").clicked() {
            events.push(RangeEvent::ResetY);
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        let low_changed = ui
            .add(egui::Slider::new(&mut p_low, 0..=PERCENT_MAX).text("xmin %"))
            .changed();
        let high_changed = ui
            .add(egui::Slider::new(&mut p_high, 0..=PERCENT_MAX).text("xmax %"))
            .changed();
        if low_changed || high_changed {
            events.push(RangeEvent::XPercentages {
                low: p_low,
                high: p_high,
            });
        }
        if ui.button("reset").clicked() {
            events.push(RangeEvent::ResetX);
        }
    });

    let (x0, x1) = state.ranges.x_bounds();
    ui.label(
        RichText::new(format!("x: {x0:.4} … {x1:.4}"))
            .small()
            .weak(),
    );

    for event in events {
        state.push(event);
    }
}

// ---------------------------------------------------------------------------
// Coordinate selector
// ---------------------------------------------------------------------------

pub fn coordinate_selector(ui: &mut Ui, state: &mut AppState) {
    let current = state.ranges.selected_coord().to_string();
    let mut chosen = None;

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Coordinate: ");
        egui::ComboBox::from_id_salt("coordinate")
            .selected_text(&current)
            .show_ui(ui, |ui: &mut Ui| {
                for name in state.array.coord_names() {
                    if ui.selectable_label(current == name, name).clicked() && current != name {
                        chosen = Some(name.to_string());
                    }
                }
            });
    });

    if let Some(name) = chosen {
        state.push(RangeEvent::SelectCoordinate(name));
    }
}

// ---------------------------------------------------------------------------
// Right side panel – metadata
// ---------------------------------------------------------------------------

/// Render dtype, shape, attributes and the coordinate list.
pub fn metadata_panel(ui: &mut Ui, state: &AppState) {
    let array = &state.array;

    ui.heading(array.name().unwrap_or("Array"));
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for line in array.metadata_lines() {
                ui.monospace(line);
            }

            ui.add_space(8.0);
            ui.strong("Coordinates:");
            for (name, coord) in array.coords() {
                let extent = coord.extent();
                let mut text = format!(
                    "{name} ({}): {} … {}",
                    coord.dtype, extent.min, extent.max
                );
                if let Some(units) = coord.units() {
                    text.push_str(&format!(" [{units}]"));
                }
                ui.monospace(text);
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{}: {} samples along '{}'",
            state.source_label(),
            state.array.len(),
            state.array.dim()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open labeled array")
        .add_filter("Supported files", &["nc", "nc3", "cdf", "json"])
        .add_filter("netCDF", &["nc", "nc3", "cdf"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}
