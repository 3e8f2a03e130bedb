//! Group-by and KPI computations over the visible records.
//!
//! Every function takes the dataset plus the indices produced by
//! [`filtered_indices`](super::filter::filtered_indices) and returns owned
//! rows ready for plotting or tabulating.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::model::{SalesDataset, SalesRecord};

// ---------------------------------------------------------------------------
// Totals shared by the group-bys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub sales: f64,
    pub profit: f64,
    pub customers: u64,
    pub count: usize,
    margin_sum: f64,
}

impl Totals {
    pub fn add(&mut self, rec: &SalesRecord) {
        self.sales += rec.sales;
        self.profit += rec.profit;
        self.customers += rec.customers;
        self.count += 1;
        self.margin_sum += rec.margin;
    }

    /// Mean of the per-record margins.
    pub fn mean_margin(&self) -> Option<f64> {
        (self.count > 0).then(|| self.margin_sum / self.count as f64)
    }

    pub fn of<'a>(records: impl IntoIterator<Item = &'a SalesRecord>) -> Self {
        let mut totals = Totals::default();
        for rec in records {
            totals.add(rec);
        }
        totals
    }
}

fn group_by<'a, K: Ord>(
    dataset: &'a SalesDataset,
    indices: &[usize],
    key: impl Fn(&'a SalesRecord) -> K,
) -> BTreeMap<K, Totals> {
    let mut groups: BTreeMap<K, Totals> = BTreeMap::new();
    for &i in indices {
        let rec = &dataset.records[i];
        groups.entry(key(rec)).or_default().add(rec);
    }
    groups
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

/// Headline figures for the KPI cards. Ratios that would divide by zero are
/// `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub total_sales: f64,
    pub total_profit: f64,
    /// Filtered sales relative to all sales, as a percentage change.
    pub sales_delta_pct: Option<f64>,
    pub margin_pct: Option<f64>,
    /// Mean of the `customers` column over the visible records.
    pub avg_customers: Option<f64>,
    pub unique_products: usize,
    pub transactions: usize,
}

pub fn compute_kpis(dataset: &SalesDataset, indices: &[usize]) -> Kpis {
    let visible = Totals::of(dataset.select(indices));
    let all_sales: f64 = dataset.records.iter().map(|r| r.sales).sum();

    let unique_products = group_by(dataset, indices, |r| r.product.as_str()).len();

    Kpis {
        total_sales: visible.sales,
        total_profit: visible.profit,
        sales_delta_pct: ratio(visible.sales, all_sales).map(|r| (r - 1.0) * 100.0),
        margin_pct: ratio(visible.profit, visible.sales).map(|r| r * 100.0),
        avg_customers: ratio(visible.customers as f64, visible.count as f64),
        unique_products,
        transactions: visible.count,
    }
}

fn ratio(num: f64, den: f64) -> Option<f64> {
    (den != 0.0).then(|| num / den)
}

// ---------------------------------------------------------------------------
// Group-bys for the charts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub totals: Totals,
}

/// Per-day sums, ascending by date.
pub fn daily_totals(dataset: &SalesDataset, indices: &[usize]) -> Vec<DailyTotals> {
    group_by(dataset, indices, |r| r.date)
        .into_iter()
        .map(|(date, totals)| DailyTotals { date, totals })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotals {
    pub key: String,
    pub totals: Totals,
}

fn keyed(groups: BTreeMap<&str, Totals>) -> Vec<GroupTotals> {
    groups
        .into_iter()
        .map(|(key, totals)| GroupTotals {
            key: key.to_string(),
            totals,
        })
        .collect()
}

/// Per-category sums, sorted by category name.
pub fn category_totals(dataset: &SalesDataset, indices: &[usize]) -> Vec<GroupTotals> {
    keyed(group_by(dataset, indices, |r| r.category.as_str()))
}

/// Per-region sums, sorted by region name.
pub fn region_totals(dataset: &SalesDataset, indices: &[usize]) -> Vec<GroupTotals> {
    keyed(group_by(dataset, indices, |r| r.region.as_str()))
}

/// Per-product sums, sorted by product name. `totals.mean_margin()` gives
/// the margin used by the margin scatter.
pub fn product_totals(dataset: &SalesDataset, indices: &[usize]) -> Vec<GroupTotals> {
    keyed(group_by(dataset, indices, |r| r.product.as_str()))
}

/// The `n` products with the largest sales, descending. Ties keep name order.
pub fn top_products(dataset: &SalesDataset, indices: &[usize], n: usize) -> Vec<GroupTotals> {
    let mut products = product_totals(dataset, indices);
    products.sort_by(|a, b| b.totals.sales.total_cmp(&a.totals.sales));
    products.truncate(n);
    products
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub date: NaiveDate,
    pub category: String,
    pub region: String,
    pub totals: Totals,
}

/// Per (date, category, region) sums, newest date first.
pub fn summary_rows(dataset: &SalesDataset, indices: &[usize]) -> Vec<SummaryRow> {
    let groups = group_by(dataset, indices, |r| {
        (r.date, r.category.as_str(), r.region.as_str())
    });
    let mut rows: Vec<SummaryRow> = groups
        .into_iter()
        .map(|((date, category, region), totals)| SummaryRow {
            date,
            category: category.to_string(),
            region: region.to_string(),
            totals,
        })
        .collect();
    // Stable: rows within a day stay in (category, region) order.
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

/// Visible indices ordered newest date first, dataset order within a day.
pub fn detail_order(dataset: &SalesDataset, indices: &[usize]) -> Vec<usize> {
    let mut order = indices.to_vec();
    order.sort_by(|&a, &b| dataset.records[b].date.cmp(&dataset.records[a].date));
    order
}

// ---------------------------------------------------------------------------
// DashboardView – everything the central panel renders
// ---------------------------------------------------------------------------

pub const TOP_PRODUCTS: usize = 10;

/// All derived data for one filter state, rebuilt on every filter change.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub kpis: Kpis,
    pub daily: Vec<DailyTotals>,
    pub by_category: Vec<GroupTotals>,
    pub by_region: Vec<GroupTotals>,
    pub top_products: Vec<GroupTotals>,
    pub by_product: Vec<GroupTotals>,
    pub summary: Vec<SummaryRow>,
    pub detail: Vec<usize>,
    /// First and last visible date.
    pub period: Option<(NaiveDate, NaiveDate)>,
}

impl DashboardView {
    pub fn build(dataset: &SalesDataset, indices: &[usize]) -> Self {
        let daily = daily_totals(dataset, indices);
        let period = match (daily.first(), daily.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        };
        DashboardView {
            kpis: compute_kpis(dataset, indices),
            by_category: category_totals(dataset, indices),
            by_region: region_totals(dataset, indices),
            top_products: top_products(dataset, indices, TOP_PRODUCTS),
            by_product: product_totals(dataset, indices),
            summary: summary_rows(dataset, indices),
            detail: detail_order(dataset, indices),
            daily,
            period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::DataSource;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn dataset() -> SalesDataset {
        SalesDataset::from_records(
            vec![
                SalesRecord::new(day(1), "Home", "Oven", 1000.0, 300.0, 20, "North"),
                SalesRecord::new(day(1), "Home", "Oven", 500.0, 100.0, 10, "South"),
                SalesRecord::new(day(2), "Clothing", "Shoes", 2000.0, 500.0, 40, "South"),
                SalesRecord::new(day(3), "Home", "Microwave", 500.0, 150.0, 6, "North"),
            ],
            DataSource::Sample,
        )
    }

    fn all(ds: &SalesDataset) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    #[test]
    fn test_kpis_over_everything() {
        let ds = dataset();
        let kpis = compute_kpis(&ds, &all(&ds));

        assert_eq!(kpis.total_sales, 4000.0);
        assert_eq!(kpis.total_profit, 1050.0);
        assert_eq!(kpis.sales_delta_pct, Some(0.0));
        assert!((kpis.margin_pct.unwrap() - 26.25).abs() < 1e-9);
        assert_eq!(kpis.avg_customers, Some(19.0));
        assert_eq!(kpis.unique_products, 3);
        assert_eq!(kpis.transactions, 4);
    }

    #[test]
    fn test_kpis_for_subset() {
        let ds = dataset();
        let kpis = compute_kpis(&ds, &[2]);
        assert_eq!(kpis.total_sales, 2000.0);
        assert_eq!(kpis.sales_delta_pct, Some(-50.0));
        assert_eq!(kpis.unique_products, 1);
    }

    #[test]
    fn test_kpis_when_nothing_visible() {
        let ds = dataset();
        let kpis = compute_kpis(&ds, &[]);
        assert_eq!(kpis.total_sales, 0.0);
        assert_eq!(kpis.sales_delta_pct, Some(-100.0));
        assert_eq!(kpis.margin_pct, None);
        assert_eq!(kpis.avg_customers, None);
        assert_eq!(kpis.transactions, 0);
    }

    #[test]
    fn test_daily_totals_sorted_by_date() {
        let ds = dataset();
        let daily = daily_totals(&ds, &[3, 0, 1]);
        let dates: Vec<NaiveDate> = daily.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day(1), day(3)]);
        assert_eq!(daily[0].totals.sales, 1500.0);
        assert_eq!(daily[0].totals.customers, 30);
    }

    #[test]
    fn test_region_and_category_groups() {
        let ds = dataset();
        let regions = region_totals(&ds, &all(&ds));
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].key, "North");
        assert_eq!(regions[0].totals.sales, 1500.0);
        assert_eq!(regions[1].totals.profit, 600.0);

        let categories = category_totals(&ds, &all(&ds));
        assert_eq!(categories[0].key, "Clothing");
        assert_eq!(categories[1].totals.sales, 2000.0);
    }

    #[test]
    fn test_top_products_descending_and_truncated() {
        let ds = dataset();
        let top = top_products(&ds, &all(&ds), 2);
        let names: Vec<&str> = top.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(names, vec!["Shoes", "Oven"]);
        assert_eq!(top[1].totals.sales, 1500.0);
    }

    #[test]
    fn test_top_products_order_is_total_with_nan_sales() {
        let ds = SalesDataset::from_records(
            vec![
                SalesRecord::new(day(1), "Home", "Oven", 100.0, 10.0, 1, "North"),
                SalesRecord::new(day(1), "Home", "Kettle", f64::NAN, 0.0, 1, "North"),
                SalesRecord::new(day(1), "Home", "Fridge", 300.0, 30.0, 1, "North"),
                SalesRecord::new(day(1), "Home", "Iron", 200.0, 20.0, 1, "North"),
                SalesRecord::new(day(1), "Home", "Lamp", 200.0, 20.0, 1, "North"),
            ],
            DataSource::Sample,
        );
        let top = top_products(&ds, &all(&ds), 5);
        let names: Vec<&str> = top.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(names, vec!["Kettle", "Fridge", "Iron", "Lamp", "Oven"]);
    }

    #[test]
    fn test_product_mean_margin() {
        let ds = dataset();
        let products = product_totals(&ds, &all(&ds));
        let oven = products.iter().find(|g| g.key == "Oven").unwrap();
        assert_eq!(oven.totals.mean_margin(), Some(25.0));
    }

    #[test]
    fn test_summary_rows_newest_first() {
        let ds = dataset();
        let rows = summary_rows(&ds, &all(&ds));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].date, day(3));
        assert_eq!(rows[3].date, day(1));
        assert_eq!(rows[2].region, "North");
        assert_eq!(rows[3].region, "South");
    }

    #[test]
    fn test_detail_order_is_stable_within_day() {
        let ds = dataset();
        assert_eq!(detail_order(&ds, &all(&ds)), vec![3, 2, 0, 1]);
    }

    #[test]
    fn test_view_period() {
        let ds = dataset();
        let view = DashboardView::build(&ds, &[1, 2]);
        assert_eq!(view.period, Some((day(1), day(2))));
        assert!(DashboardView::build(&ds, &[]).period.is_none());
    }
}
