use eframe::egui;

use crate::state::AppState;
use crate::ui::panels;
use crate::ui::plot::PlotSurface;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct XrvizApp {
    pub state: AppState,
    surface: PlotSurface,
}

impl XrvizApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            surface: PlotSurface::default(),
        }
    }
}

impl eframe::App for XrvizApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Range controls above the plot ----
        egui::TopBottomPanel::top("range_controls").show(ctx, |ui| {
            panels::range_controls(ui, &mut self.state);
        });

        // ---- Coordinate selector below the plot ----
        egui::TopBottomPanel::bottom("coordinate_panel").show(ctx, |ui| {
            panels::coordinate_selector(ui, &mut self.state);
        });

        // ---- Right side panel: metadata ----
        egui::SidePanel::right("metadata_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::metadata_panel(ui, &self.state);
            });

        // Edits made above take effect before this frame's plot is drawn.
        if self.state.apply_pending() {
            ctx.request_repaint();
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            self.surface.show(ui, &self.state.array, &self.state.ranges);
        });
    }
}
