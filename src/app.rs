use eframe::egui;

use crate::config::Args;
use crate::data::loader::load_or_sample;
use crate::state::AppState;
use crate::ui::{dashboard, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct SalesDashboardApp {
    pub state: AppState,
}

impl SalesDashboardApp {
    /// Load the configured data file, falling back to sample data when it
    /// is missing. Other load errors leave the dashboard empty with the
    /// error shown in the top bar.
    pub fn new(args: &Args) -> Self {
        let mut state = AppState {
            export_dir: args.export_dir.clone(),
            ..AppState::default()
        };

        let loaded = match args.seed {
            Some(seed) => {
                use rand::SeedableRng;
                load_or_sample(&args.data, &mut rand::rngs::StdRng::seed_from_u64(seed))
            }
            None => load_or_sample(&args.data, &mut rand::rng()),
        };

        match loaded {
            Ok(outcome) => {
                state.set_dataset(outcome.dataset);
                state.warning = outcome.warning;
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", args.data.display());
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }

        Self { state }
    }
}

impl eframe::App for SalesDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, charts, table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard::central_panel(ui, &mut self.state);
        });
    }
}
