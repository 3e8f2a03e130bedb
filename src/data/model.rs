use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// SalesRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single sales transaction. `margin` is derived from `profit` and `sales`
/// when the record is built and never read from the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub category: String,
    pub product: String,
    pub sales: f64,
    pub profit: f64,
    pub customers: u64,
    pub region: String,
    /// Profit as a percentage of sales, rounded to 2 decimals.
    pub margin: f64,
}

impl SalesRecord {
    pub fn new(
        date: NaiveDate,
        category: impl Into<String>,
        product: impl Into<String>,
        sales: f64,
        profit: f64,
        customers: u64,
        region: impl Into<String>,
    ) -> Self {
        SalesRecord {
            date,
            category: category.into(),
            product: product.into(),
            sales,
            profit,
            customers,
            region: region.into(),
            margin: margin_pct(profit, sales),
        }
    }
}

/// `profit / sales * 100` rounded to two decimals; zero sales gives 0.0.
pub fn margin_pct(profit: f64, sales: f64) -> f64 {
    if sales == 0.0 {
        return 0.0;
    }
    round2(profit / sales * 100.0)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// RawRecord – the on-disk shape shared by the CSV and JSON loaders
// ---------------------------------------------------------------------------

/// Row as found in a source file. Extra columns (e.g. an exported `margin`)
/// are ignored by serde.
#[derive(Debug, Deserialize)]
pub struct RawRecord {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub category: String,
    pub product: String,
    pub sales: f64,
    pub profit: f64,
    pub customers: f64,
    pub region: String,
}

impl From<RawRecord> for SalesRecord {
    fn from(raw: RawRecord) -> Self {
        SalesRecord::new(
            raw.date,
            raw.category,
            raw.product,
            raw.sales,
            raw.profit,
            customers_from_f64(raw.customers),
            raw.region,
        )
    }
}

pub fn customers_from_f64(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.round() as u64
    } else {
        0
    }
}

/// Dates arrive as text in CSV and as text or epoch milliseconds in JSON.
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    struct DateVisitor;

    impl Visitor<'_> for DateVisitor {
        type Value = NaiveDate;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a date string or epoch milliseconds")
        }

        fn visit_str<E: de::Error>(self, s: &str) -> Result<NaiveDate, E> {
            parse_date(s).ok_or_else(|| E::custom(format!("invalid date '{s}'")))
        }

        fn visit_i64<E: de::Error>(self, ms: i64) -> Result<NaiveDate, E> {
            DateTime::from_timestamp_millis(ms)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| E::custom(format!("timestamp {ms} out of range")))
        }

        fn visit_u64<E: de::Error>(self, ms: u64) -> Result<NaiveDate, E> {
            let ms = i64::try_from(ms).map_err(|_| E::custom("timestamp out of range"))?;
            self.visit_i64(ms)
        }
    }

    deserializer.deserialize_any(DateVisitor)
}

/// Accepts a plain day, a naive timestamp, or an RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

// ---------------------------------------------------------------------------
// SalesDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    File(PathBuf),
    Sample,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Sample => write!(f, "generated sample"),
        }
    }
}

/// The full dataset with pre-computed filter options.
#[derive(Debug, Clone)]
pub struct SalesDataset {
    pub records: Vec<SalesRecord>,
    /// Distinct categories in first-appearance order.
    pub categories: Vec<String>,
    /// Distinct regions in first-appearance order.
    pub regions: Vec<String>,
    pub products: BTreeSet<String>,
    /// Earliest and latest date, `None` when there are no records.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub source: DataSource,
}

impl SalesDataset {
    pub fn from_records(records: Vec<SalesRecord>, source: DataSource) -> Self {
        let mut categories: Vec<String> = Vec::new();
        let mut regions: Vec<String> = Vec::new();
        let mut products = BTreeSet::new();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;

        for rec in &records {
            if !categories.contains(&rec.category) {
                categories.push(rec.category.clone());
            }
            if !regions.contains(&rec.region) {
                regions.push(rec.region.clone());
            }
            products.insert(rec.product.clone());
            date_bounds = Some(match date_bounds {
                None => (rec.date, rec.date),
                Some((lo, hi)) => (lo.min(rec.date), hi.max(rec.date)),
            });
        }

        SalesDataset {
            records,
            categories,
            regions,
            products,
            date_bounds,
            source,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate the records at `indices`, in the order given.
    pub fn select<'a>(&'a self, indices: &'a [usize]) -> impl Iterator<Item = &'a SalesRecord> + 'a {
        indices.iter().map(move |&i| &self.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_margin_is_rounded_percentage() {
        let rec = SalesRecord::new(day(1), "Home", "Oven", 3000.0, 1000.0, 10, "North");
        assert_eq!(rec.margin, 33.33);

        let rec = SalesRecord::new(day(1), "Home", "Oven", 8000.0, 2345.678, 10, "North");
        assert_eq!(rec.margin, 29.32);
    }

    #[test]
    fn test_margin_with_zero_sales() {
        assert_eq!(margin_pct(50.0, 0.0), 0.0);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-05"), Some(day(5)));
        assert_eq!(parse_date("2024-01-05 00:00:00"), Some(day(5)));
        assert_eq!(parse_date("2024-01-05T13:45:00"), Some(day(5)));
        assert_eq!(parse_date("2024-01-05T00:00:00.000"), Some(day(5)));
        assert_eq!(parse_date("2024-01-05T10:00:00+01:00"), Some(day(5)));
        assert_eq!(parse_date(" 2024-01-05 "), Some(day(5)));
        assert_eq!(parse_date("05/01/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_customers_from_f64() {
        assert_eq!(customers_from_f64(41.6), 42);
        assert_eq!(customers_from_f64(-3.0), 0);
        assert_eq!(customers_from_f64(f64::NAN), 0);
    }

    #[test]
    fn test_dataset_indices() {
        let ds = SalesDataset::from_records(
            vec![
                SalesRecord::new(day(3), "Home", "Oven", 100.0, 30.0, 2, "South"),
                SalesRecord::new(day(1), "Clothing", "Shoes", 100.0, 30.0, 2, "North"),
                SalesRecord::new(day(2), "Home", "Microwave", 100.0, 30.0, 2, "South"),
            ],
            DataSource::Sample,
        );
        assert_eq!(ds.categories, vec!["Home", "Clothing"]);
        assert_eq!(ds.regions, vec!["South", "North"]);
        assert_eq!(ds.products.len(), 3);
        assert_eq!(ds.date_bounds, Some((day(1), day(3))));
    }

    #[test]
    fn test_empty_dataset_has_no_bounds() {
        let ds = SalesDataset::from_records(Vec::new(), DataSource::Sample);
        assert!(ds.is_empty());
        assert_eq!(ds.date_bounds, None);
    }
}
