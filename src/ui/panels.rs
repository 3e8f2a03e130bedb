use chrono::Local;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::export::{export_file_name, export_to_path};
use crate::state::{AppState, FilterField};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            date_filter(ui, state);
            ui.separator();

            multi_select(ui, state, FilterField::Category, "Category");
            multi_select(ui, state, FilterField::Region, "Region");
            ui.separator();

            export_section(ui, state);
            ui.separator();

            info_box(ui, state);
        });
}

fn date_filter(ui: &mut Ui, state: &mut AppState) {
    let Some((lo, hi)) = state.dataset.as_ref().and_then(|ds| ds.date_bounds) else {
        ui.label("No dates in dataset.");
        return;
    };
    let (mut from, mut to) = state.filters.date_range.unwrap_or((lo, hi));

    ui.strong("Date range");
    egui::Grid::new("date_range_grid")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.label("From");
            ui.add(DatePickerButton::new(&mut from).id_salt("date_from"));
            ui.end_row();

            ui.label("To");
            ui.add(DatePickerButton::new(&mut to).id_salt("date_to"));
            ui.end_row();
        });

    state.set_date_range(from, to);

    if state.filters.is_date_range_inverted() {
        ui.label(RichText::new("Start date is after end date.").color(Color32::RED));
    }
    if ui.small_button("Full range").clicked() {
        state.reset_date_range();
    }
}

/// Checkbox list with All/None buttons for one multi-select filter.
fn multi_select(ui: &mut Ui, state: &mut AppState, field: FilterField, title: &str) {
    let options = state.options(field).to_vec();
    let n_selected = options
        .iter()
        .filter(|v| state.is_selected(field, v))
        .count();
    let header_text = format!("{title}  ({n_selected}/{})", options.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(field);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(field);
                }
            });

            let colors = match field {
                FilterField::Category => state.category_colors.clone(),
                FilterField::Region => state.region_colors.clone(),
            };

            for value in &options {
                let mut checked = state.is_selected(field, value);
                let mut text = RichText::new(value);
                if let Some(cm) = &colors {
                    text = text.color(cm.color_for(value));
                }
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_filter_value(field, value);
                }
            }

            if n_selected == 0 {
                ui.label(RichText::new("Nothing selected.").weak());
            }
        });
}

fn export_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Export data");
    let n = state.visible_indices.len();
    if ui
        .button(format!("Download filtered CSV ({n} rows)"))
        .clicked()
    {
        save_file_dialog(state);
    }
}

/// Summary of what is on screen: latest date in the data, visible record
/// count, and the visible period.
fn info_box(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dataset else {
        return;
    };
    let updated = ds
        .date_bounds
        .map(|(_, hi)| hi.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "–".to_string());
    let period = state
        .view
        .as_ref()
        .and_then(|v| v.period)
        .map(|(a, b)| format!("{} – {}", a.format("%d/%m"), b.format("%d/%m")))
        .unwrap_or_else(|| "–".to_string());

    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.strong("Dashboard info");
        ui.label(format!("Data up to: {updated}"));
        ui.label(format!("Records shown: {}", state.visible_indices.len()));
        ui.label(format!("Period analysed: {period}"));
        ui.label(RichText::new(format!("Source: {}", ds.source)).weak());
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
            let can_export = state.dataset.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export filtered…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.warning {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::YELLOW));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} records from {} ({} categories, {} regions)",
                    dataset.len(),
                    path.display(),
                    dataset.categories.len(),
                    dataset.regions.len()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .set_file_name(export_file_name(Local::now().date_naive()))
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet"]);
    if let Some(dir) = &state.export_dir {
        dialog = dialog.set_directory(dir);
    }

    let Some(path) = dialog.save_file() else {
        return;
    };

    match export_to_path(&path, state.visible_records()) {
        Ok(_) => {
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to export: {e:#}");
            state.status_message = Some(format!("Export failed: {e:#}"));
        }
    }
}
