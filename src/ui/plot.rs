use std::f32::consts::TAU;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Align2, Color32, Pos2, RichText, Sense, Shape, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, Legend, Line, MarkerShape, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::color::{ColorMap, ColorScale};
use crate::data::aggregate::{DailyTotals, GroupTotals};
use crate::ui::kpi::{format_currency, format_thousands};

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Date axis helpers
// ---------------------------------------------------------------------------

/// Plot x-coordinate for a date (days since the common era).
pub fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

// ---------------------------------------------------------------------------
// Daily sales line
// ---------------------------------------------------------------------------

pub fn daily_sales_chart(ui: &mut Ui, daily: &[DailyTotals]) {
    ui.heading("Daily sales");

    let points: PlotPoints = daily
        .iter()
        .map(|d| [date_to_x(d.date), d.totals.sales])
        .collect();
    let markers: PlotPoints = daily
        .iter()
        .map(|d| [date_to_x(d.date), d.totals.sales])
        .collect();

    Plot::new("daily_sales_plot")
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Sales (€)")
        .x_axis_formatter(|mark, _range| {
            x_to_date(mark.value)
                .map(|d| d.format("%d/%m").to_string())
                .unwrap_or_default()
        })
        .label_formatter(|_name, value| {
            let date = x_to_date(value.x)
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_default();
            format!("{date}\n{}", format_currency(value.y))
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(points)
                    .name("Sales")
                    .color(Color32::LIGHT_BLUE)
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(markers)
                    .shape(MarkerShape::Circle)
                    .radius(3.0)
                    .color(Color32::LIGHT_BLUE),
            );
        });
}

// ---------------------------------------------------------------------------
// Category donut
// ---------------------------------------------------------------------------

/// Angular extent of each slice as `(start, end)` radians, clockwise from
/// twelve o'clock. Non-positive values get an empty slice.
pub fn slice_angles(values: &[f64]) -> Vec<(f32, f32)> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let mut start = -TAU / 4.0;
    values
        .iter()
        .map(|&v| {
            let share = if total > 0.0 && v > 0.0 { v / total } else { 0.0 };
            let end = start + share as f32 * TAU;
            let slice = (start, end);
            start = end;
            slice
        })
        .collect()
}

/// Donut chart of sales per category, drawn with thick arcs, plus a legend
/// with shares.
pub fn category_donut(ui: &mut Ui, by_category: &[GroupTotals], colors: Option<&ColorMap>) {
    ui.heading("Sales by category");

    let sales: Vec<f64> = by_category.iter().map(|g| g.totals.sales).collect();
    let total: f64 = sales.iter().sum();
    let angles = slice_angles(&sales);

    let side = ui.available_width().min(CHART_HEIGHT - 60.0).max(80.0);
    let (response, painter) = ui.allocate_painter(Vec2::splat(side), Sense::hover());
    let center = response.rect.center();
    let outer = side / 2.0 - 4.0;
    // Hole is 40% of the radius; the ring is drawn along its mid-line.
    let thickness = outer * 0.6;
    let radius = outer - thickness / 2.0;

    for (group, &(start, end)) in by_category.iter().zip(&angles) {
        if end <= start {
            continue;
        }
        let color = colors
            .map(|c| c.color_for(&group.key))
            .unwrap_or(Color32::LIGHT_BLUE);
        let steps = (((end - start) / TAU) * 128.0).ceil().max(2.0) as usize;
        let arc: Vec<Pos2> = (0..=steps)
            .map(|i| {
                let a = start + (end - start) * i as f32 / steps as f32;
                center + radius * Vec2::angled(a)
            })
            .collect();
        painter.add(Shape::line(arc, Stroke::new(thickness, color)));
    }

    if total <= 0.0 {
        painter.text(
            center,
            egui::Align2::CENTER_CENTER,
            "no sales",
            egui::FontId::proportional(14.0),
            ui.visuals().weak_text_color(),
        );
    }

    for group in by_category {
        let color = colors
            .map(|c| c.color_for(&group.key))
            .unwrap_or(Color32::LIGHT_BLUE);
        let share = if total > 0.0 {
            group.totals.sales / total * 100.0
        } else {
            0.0
        };
        ui.horizontal(|ui: &mut Ui| {
            ui.label(RichText::new("■").color(color));
            ui.label(format!("{}  {share:.1}%", group.key));
        });
    }
}

// ---------------------------------------------------------------------------
// Detailed analysis tabs
// ---------------------------------------------------------------------------

/// Vertical bars of sales per region, coloured by region.
pub fn region_bar_chart(ui: &mut Ui, by_region: &[GroupTotals], colors: Option<&ColorMap>) {
    let bars: Vec<Bar> = by_region
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let color = colors
                .map(|c| c.color_for(&g.key))
                .unwrap_or(Color32::LIGHT_BLUE);
            Bar::new(i as f64, g.totals.sales)
                .name(format!("{}: € {}", g.key, format_thousands(g.totals.sales)))
                .fill(color)
                .width(0.6)
        })
        .collect();

    let labels: Vec<String> = by_region.iter().map(|g| g.key.clone()).collect();
    let values = bar_value_labels(by_region);

    Plot::new("region_sales_plot")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Region")
        .y_axis_label("Sales (€)")
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .allow_scroll(false)
        .allow_drag(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Sales by region"));
            for (x, y, label) in values {
                plot_ui.text(
                    Text::new(PlotPoint::new(x, y), RichText::new(label).strong())
                        .anchor(Align2::CENTER_BOTTOM),
                );
            }
        });
}

/// `(x, top of bar, "€ 1,234")` for each bar, drawn just above it.
fn bar_value_labels(groups: &[GroupTotals]) -> Vec<(f64, f64, String)> {
    groups
        .iter()
        .enumerate()
        .map(|(i, g)| (i as f64, g.totals.sales, format_currency(g.totals.sales)))
        .collect()
}

/// Horizontal bars for the top products, largest at the top, coloured on a
/// continuous scale by sales.
pub fn top_products_chart(ui: &mut Ui, top: &[GroupTotals]) {
    let max = top.iter().map(|g| g.totals.sales).fold(0.0_f64, f64::max);
    let min = top.iter().map(|g| g.totals.sales).fold(max, f64::min);
    let n = top.len();

    let bars: Vec<Bar> = top
        .iter()
        .enumerate()
        .map(|(i, g)| {
            Bar::new((n - 1 - i) as f64, g.totals.sales)
                .name(format!("{}: € {}", g.key, format_thousands(g.totals.sales)))
                .fill(ColorScale::Viridis.color_in_range(g.totals.sales, min, max))
                .width(0.7)
        })
        .collect();

    let labels: Vec<String> = top.iter().rev().map(|g| g.key.clone()).collect();

    Plot::new("top_products_plot")
        .height(CHART_HEIGHT)
        .x_axis_label("Sales (€)")
        .y_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .allow_scroll(false)
        .allow_drag(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .horizontal()
                    .name(format!("Top {n} products by sales")),
            );
        });
}

/// One marker per product: x = sales, y = mean margin, marker size grows
/// with sales and colour goes red→green with margin.
pub fn margin_scatter(ui: &mut Ui, by_product: &[GroupTotals]) {
    let margins: Vec<(f64, &GroupTotals)> = by_product
        .iter()
        .filter_map(|g| g.totals.mean_margin().map(|m| (m, g)))
        .collect();

    let max_sales = margins
        .iter()
        .map(|(_, g)| g.totals.sales)
        .fold(0.0_f64, f64::max);
    let min_margin = margins.iter().map(|(m, _)| *m).fold(f64::INFINITY, f64::min);
    let max_margin = margins
        .iter()
        .map(|(m, _)| *m)
        .fold(f64::NEG_INFINITY, f64::max);

    Plot::new("margin_scatter_plot")
        .height(CHART_HEIGHT)
        .x_axis_label("Sales (€)")
        .y_axis_label("Margin %")
        .label_formatter(|name, value| {
            let title = if name.is_empty() { String::new() } else { format!("{name}\n") };
            format!(
                "{title}{}\n{:.2}% margin",
                format_currency(value.x),
                value.y
            )
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (margin, g) in &margins {
                let size = if max_sales > 0.0 {
                    4.0 + 12.0 * (g.totals.sales / max_sales) as f32
                } else {
                    4.0
                };
                plot_ui.points(
                    Points::new(vec![[g.totals.sales, *margin]])
                        .name(&g.key)
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(size)
                        .color(ColorScale::RedYellowGreen.color_in_range(
                            *margin,
                            min_margin,
                            max_margin,
                        )),
                );
            }
        });
}

/// Label for an axis position that indexes into `labels`; blank between
/// integer positions.
fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::region_totals;
    use crate::data::model::{DataSource, SalesDataset, SalesRecord};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn test_date_axis_round_trip() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        assert_eq!(x_to_date(date_to_x(day)), Some(day));
        assert_eq!(x_to_date(date_to_x(day) + 0.3), Some(day));
        assert_eq!(x_to_date(f64::NAN), None);
    }

    #[test]
    fn test_slice_angles_cover_circle() {
        let angles = slice_angles(&[1.0, 1.0, 2.0]);
        assert_eq!(angles.len(), 3);
        let (first_start, _) = angles[0];
        let (_, last_end) = angles[2];
        assert!((last_end - first_start - TAU).abs() < 1e-4);
        assert!((angles[2].1 - angles[2].0 - TAU / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_slice_angles_without_sales() {
        for (start, end) in slice_angles(&[0.0, 0.0]) {
            assert_eq!(start, end);
        }
    }

    #[test]
    fn test_category_label() {
        let labels = vec!["North".to_string(), "South".to_string()];
        assert_eq!(category_label(&labels, 1.0), "South");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }

    #[test]
    fn test_bar_value_labels_sit_on_each_bar() {
        let ds = SalesDataset::from_records(
            vec![
                SalesRecord::new(day(), "Home", "Oven", 12_345.0, 3_000.0, 20, "North"),
                SalesRecord::new(day(), "Home", "Oven", 800.0, 200.0, 5, "South"),
            ],
            DataSource::Sample,
        );
        let all: Vec<usize> = (0..ds.len()).collect();
        let labels = bar_value_labels(&region_totals(&ds, &all));
        assert_eq!(
            labels,
            vec![
                (0.0, 12_345.0, "€ 12,345".to_string()),
                (1.0, 800.0, "€ 800".to_string()),
            ]
        );
    }
}
