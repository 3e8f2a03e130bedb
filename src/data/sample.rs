use chrono::{Days, NaiveDate};
use rand::seq::IndexedRandom;
use rand::Rng;

use super::model::{DataSource, SalesDataset, SalesRecord};

// ---------------------------------------------------------------------------
// Synthetic sales data, used when no source file exists
// ---------------------------------------------------------------------------

pub const SAMPLE_DAYS: u64 = 31;

pub const CATALOG: [(&str, &[&str]); 3] = [
    ("Electronics", &["Smartphone", "Tablet", "Laptop", "TV", "Smartwatch"]),
    ("Clothing", &["Jacket", "Trousers", "Shoes", "T-shirt"]),
    ("Home", &["Oven", "Refrigerator", "Washing machine", "Microwave"]),
];

pub const REGIONS: [&str; 3] = ["North", "Center", "South"];

/// First day of the sample window.
pub fn sample_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Last day of the sample window (inclusive).
pub fn sample_end() -> NaiveDate {
    sample_start() + Days::new(SAMPLE_DAYS - 1)
}

/// One record per (day, category, product) with randomised figures and
/// a randomly chosen region.
pub fn generate_sample_data<R: Rng>(rng: &mut R) -> SalesDataset {
    let per_day: usize = CATALOG.iter().map(|(_, products)| products.len()).sum();
    let mut records = Vec::with_capacity(per_day * SAMPLE_DAYS as usize);

    for offset in 0..SAMPLE_DAYS {
        let date = sample_start() + Days::new(offset);
        for (category, products) in CATALOG {
            for &product in products {
                let sales = rng.random_range(1000..20000_u32) as f64;
                let profit = sales * rng.random_range(0.25..0.35);
                let divisor = rng.random_range(40..60_u32) as f64;
                let customers = (sales / divisor) as u64;
                let region = REGIONS.choose(rng).copied().unwrap_or(REGIONS[0]);

                records.push(SalesRecord::new(
                    date, category, product, sales, profit, customers, region,
                ));
            }
        }
    }

    log::debug!("generated {} sample records", records.len());
    SalesDataset::from_records(records, DataSource::Sample)
}
