use chrono::Local;
use eframe::egui::{RichText, ScrollArea, Ui};

use crate::state::{AnalysisTab, AppState, ViewMode};
use crate::ui::{kpi, plot, table};

// ---------------------------------------------------------------------------
// Central panel: KPIs, charts, table
// ---------------------------------------------------------------------------

/// Render the dashboard in the central panel.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    let (Some(dataset), Some(view)) = (&state.dataset, &state.view) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view sales  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            kpi::kpi_row(ui, &view.kpis);
            ui.separator();

            ui.columns(2, |columns| {
                plot::daily_sales_chart(&mut columns[0], &view.daily);
                plot::category_donut(
                    &mut columns[1],
                    &view.by_category,
                    state.category_colors.as_ref(),
                );
            });
            ui.separator();

            ui.heading("Detailed analysis");
            ui.horizontal(|ui: &mut Ui| {
                ui.selectable_value(&mut state.analysis_tab, AnalysisTab::ByRegion, "By region");
                ui.selectable_value(&mut state.analysis_tab, AnalysisTab::TopProducts, "Top products");
                ui.selectable_value(&mut state.analysis_tab, AnalysisTab::Margins, "Margins");
            });
            match state.analysis_tab {
                AnalysisTab::ByRegion => {
                    plot::region_bar_chart(ui, &view.by_region, state.region_colors.as_ref())
                }
                AnalysisTab::TopProducts => plot::top_products_chart(ui, &view.top_products),
                AnalysisTab::Margins => plot::margin_scatter(ui, &view.by_product),
            }
            ui.separator();

            ui.heading("Detailed data");
            ui.horizontal(|ui: &mut Ui| {
                ui.label("View:");
                ui.radio_value(&mut state.view_mode, ViewMode::Summary, "Summary");
                ui.radio_value(&mut state.view_mode, ViewMode::Detail, "Full detail");
            });
            table::data_table(ui, state.view_mode, dataset, &view.summary, &view.detail);

            ui.separator();
            ui.label(
                RichText::new(format!(
                    "Last refresh: {}",
                    Local::now().format("%d/%m/%Y %H:%M")
                ))
                .weak()
                .small(),
            );
        });
}
