use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::aggregate::Kpis;

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Round to a whole number and group thousands with commas: `-1,234,567`.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return "–".to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn format_currency(value: f64) -> String {
    format!("€ {}", format_thousands(value))
}

/// Signed percentage with one decimal: `+4.2%`.
pub fn format_delta(pct: f64) -> String {
    format!("{pct:+.1}%")
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

struct Card {
    label: &'static str,
    value: String,
    delta: String,
    delta_color: Color32,
}

fn sign_color(v: f64) -> Color32 {
    if v < 0.0 {
        Color32::from_rgb(220, 80, 80)
    } else {
        Color32::from_rgb(80, 180, 100)
    }
}

fn cards(kpis: &Kpis) -> [Card; 4] {
    let neutral = Color32::GRAY;
    [
        Card {
            label: "Total sales",
            value: format_currency(kpis.total_sales),
            delta: kpis
                .sales_delta_pct
                .map(format_delta)
                .unwrap_or_else(|| "–".to_string()),
            delta_color: kpis.sales_delta_pct.map(sign_color).unwrap_or(neutral),
        },
        Card {
            label: "Total profit",
            value: format_currency(kpis.total_profit),
            delta: kpis
                .margin_pct
                .map(|m| format!("{m:.1}% margin"))
                .unwrap_or_else(|| "no sales".to_string()),
            delta_color: kpis.margin_pct.map(sign_color).unwrap_or(neutral),
        },
        Card {
            label: "Avg. customers",
            value: kpis
                .avg_customers
                .map(|c| format!("{c:.0}"))
                .unwrap_or_else(|| "–".to_string()),
            delta: "per record".to_string(),
            delta_color: neutral,
        },
        Card {
            label: "Products sold",
            value: kpis.unique_products.to_string(),
            delta: format!("{} transactions", kpis.transactions),
            delta_color: neutral,
        },
    ]
}

/// Render the four KPI cards side by side.
pub fn kpi_row(ui: &mut Ui, kpis: &Kpis) {
    ui.heading("Key performance indicators");
    ui.columns(4, |columns| {
        for (col, card) in columns.iter_mut().zip(cards(kpis)) {
            egui::Frame::group(col.style()).show(col, |ui: &mut Ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(card.label).weak());
                ui.label(RichText::new(card.value).size(24.0).strong());
                ui.label(RichText::new(card.delta).color(card.delta_color));
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1234567.8), "1,234,568");
        assert_eq!(format_thousands(-45210.0), "-45,210");
        assert_eq!(format_thousands(f64::NAN), "–");
    }

    #[test]
    fn test_format_currency_and_delta() {
        assert_eq!(format_currency(2_500_000.0), "€ 2,500,000");
        assert_eq!(format_delta(4.26), "+4.3%");
        assert_eq!(format_delta(-37.5), "-37.5%");
        assert_eq!(format_delta(0.0), "+0.0%");
    }

    #[test]
    fn test_cards_for_empty_selection() {
        let kpis = Kpis {
            total_sales: 0.0,
            total_profit: 0.0,
            sales_delta_pct: Some(-100.0),
            margin_pct: None,
            avg_customers: None,
            unique_products: 0,
            transactions: 0,
        };
        let cards = cards(&kpis);
        assert_eq!(cards[0].delta, "-100.0%");
        assert_eq!(cards[1].delta, "no sales");
        assert_eq!(cards[2].value, "–");
        assert_eq!(cards[3].delta, "0 transactions");
    }
}
