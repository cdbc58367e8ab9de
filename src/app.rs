use eframe::egui;

use crate::config::DashboardConfig;
use crate::session::Session;
use crate::ui::{dashboard, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub session: Session,
}

impl DashboardApp {
    /// Build the app and load every dashboard from its default data.
    pub fn new(config: DashboardConfig) -> Self {
        let mut session = Session::new(config);
        session.load_all();
        Self { session }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar and tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.session);
        });

        let active = self.session.active;

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, self.session.pane_mut(active));
            });

        // ---- Central panel: the dashboard ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let preview_rows = self.session.config.preview_rows;
            let default_path = self.session.config.default_path(active).to_path_buf();
            let pane = self.session.pane(active);

            ui.heading(format!("{active} dashboard"));
            match &pane.report {
                Some(report) => {
                    panels::load_notes(ui, pane);
                    ui.separator();
                    dashboard::show(ui, report, &pane.visible, preview_rows);
                }
                None => panels::no_data(ui, pane, &default_path),
            }
        });
    }
}
