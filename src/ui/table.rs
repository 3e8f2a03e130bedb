use eframe::egui::{Align, Layout, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::aggregate::SummaryRow;
use crate::data::model::SalesDataset;
use crate::state::ViewMode;

const ROW_HEIGHT: f32 = 18.0;
const TABLE_HEIGHT: f32 = 320.0;

fn money(v: f64) -> String {
    format!("{v:.2}")
}

/// Render the data table in the requested mode. `detail` holds record
/// indices already ordered newest first.
pub fn data_table(
    ui: &mut Ui,
    mode: ViewMode,
    dataset: &SalesDataset,
    summary: &[SummaryRow],
    detail: &[usize],
) {
    match mode {
        ViewMode::Summary => summary_table(ui, summary),
        ViewMode::Detail => detail_table(ui, dataset, detail),
    }
}

fn summary_table(ui: &mut Ui, rows: &[SummaryRow]) {
    let headers = ["Date", "Category", "Region", "Sales", "Profit", "Customers", "Margin %"];

    ui.push_id("summary_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(TABLE_HEIGHT)
            .cell_layout(Layout::left_to_right(Align::Center))
            .columns(Column::auto().at_least(80.0), headers.len() - 1)
            .column(Column::remainder())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for title in headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let r = &rows[row.index()];
                    let cells = [
                        r.date.format("%Y-%m-%d").to_string(),
                        r.category.clone(),
                        r.region.clone(),
                        money(r.totals.sales),
                        money(r.totals.profit),
                        r.totals.customers.to_string(),
                        r.totals
                            .mean_margin()
                            .map(|m| format!("{m:.2}"))
                            .unwrap_or_default(),
                    ];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}

fn detail_table(ui: &mut Ui, dataset: &SalesDataset, order: &[usize]) {
    let headers = [
        "Date",
        "Category",
        "Product",
        "Sales",
        "Profit",
        "Customers",
        "Region",
        "Margin %",
    ];

    ui.push_id("detail_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(TABLE_HEIGHT)
            .cell_layout(Layout::left_to_right(Align::Center))
            .columns(Column::auto().at_least(70.0), headers.len() - 1)
            .column(Column::remainder())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for title in headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, order.len(), |mut row| {
                    let rec = &dataset.records[order[row.index()]];
                    let cells = [
                        rec.date.format("%Y-%m-%d").to_string(),
                        rec.category.clone(),
                        rec.product.clone(),
                        money(rec.sales),
                        money(rec.profit),
                        rec.customers.to_string(),
                        rec.region.clone(),
                        format!("{:.2}", rec.margin),
                    ];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}
