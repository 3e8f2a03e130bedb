use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;

use super::model::SalesRecord;

// ---------------------------------------------------------------------------
// Export of the filtered view
// ---------------------------------------------------------------------------

pub const EXPORT_COLUMNS: [&str; 8] = [
    "date",
    "category",
    "product",
    "sales",
    "profit",
    "customers",
    "region",
    "margin",
];

/// `dashboard_data_YYYYMMDD.csv` for the given day.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("dashboard_data_{}.csv", today.format("%Y%m%d"))
}

/// Write `records` as CSV with a header row. Columns follow
/// [`EXPORT_COLUMNS`]; the header is written even when there are no rows.
pub fn write_csv<'a, W: Write>(
    writer: W,
    records: impl IntoIterator<Item = &'a SalesRecord>,
) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    for rec in records {
        csv_writer
            .serialize(rec)
            .with_context(|| format!("writing CSV row {written}"))?;
        written += 1;
    }
    if written == 0 {
        csv_writer
            .write_record(EXPORT_COLUMNS)
            .context("writing CSV header")?;
    }
    csv_writer.flush().context("flushing CSV output")?;
    Ok(written)
}

/// Write `records` to a Parquet file with `date` stored as Date32.
pub fn write_parquet<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a SalesRecord>,
) -> Result<usize> {
    let records: Vec<&SalesRecord> = records.into_iter().collect();
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("unix epoch")?;

    let dates = Date32Array::from(
        records
            .iter()
            .map(|r| (r.date - epoch).num_days() as i32)
            .collect::<Vec<_>>(),
    );
    let category = StringArray::from(records.iter().map(|r| r.category.as_str()).collect::<Vec<_>>());
    let product = StringArray::from(records.iter().map(|r| r.product.as_str()).collect::<Vec<_>>());
    let sales = Float64Array::from(records.iter().map(|r| r.sales).collect::<Vec<_>>());
    let profit = Float64Array::from(records.iter().map(|r| r.profit).collect::<Vec<_>>());
    let customers = Int64Array::from(
        records
            .iter()
            .map(|r| r.customers as i64)
            .collect::<Vec<_>>(),
    );
    let region = StringArray::from(records.iter().map(|r| r.region.as_str()).collect::<Vec<_>>());
    let margin = Float64Array::from(records.iter().map(|r| r.margin).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Date32, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("product", DataType::Utf8, false),
        Field::new("sales", DataType::Float64, false),
        Field::new("profit", DataType::Float64, false),
        Field::new("customers", DataType::Int64, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("margin", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(dates),
            Arc::new(category),
            Arc::new(product),
            Arc::new(sales),
            Arc::new(profit),
            Arc::new(customers),
            Arc::new(region),
            Arc::new(margin),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    Ok(records.len())
}

/// Export to `path`, choosing Parquet for `.parquet`/`.pq` and CSV otherwise.
pub fn export_to_path<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a SalesRecord>,
) -> Result<usize> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let written = match ext.as_str() {
        "parquet" | "pq" => write_parquet(path, records)?,
        _ => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_csv(std::io::BufWriter::new(file), records)?
        }
    };
    log::info!("Exported {written} records to {}", path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn records() -> Vec<SalesRecord> {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        vec![
            SalesRecord::new(day, "Home", "Washing machine", 1000.0, 300.0, 20, "North"),
            SalesRecord::new(day, "Clothing", "T-shirt, cotton", 2000.0, 500.0, 41, "South"),
        ]
    }

    #[test]
    fn test_export_file_name_uses_date() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(export_file_name(day), "dashboard_data_20260309.csv");
    }

    #[test]
    fn test_write_csv_layout() {
        let mut buf = Vec::new();
        let n = write_csv(&mut buf, &records()).unwrap();
        assert_eq!(n, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "date,category,product,sales,profit,customers,region,margin"
        );
        assert_eq!(lines[1], "2024-01-05,Home,Washing machine,1000.0,300.0,20,North,30.0");
        assert_eq!(
            lines[2],
            "2024-01-05,Clothing,\"T-shirt, cotton\",2000.0,500.0,41,South,25.0"
        );
    }

    #[test]
    fn test_write_csv_empty_selection_writes_header() {
        let mut buf = Vec::new();
        let n = write_csv(&mut buf, &Vec::<SalesRecord>::new()).unwrap();
        assert_eq!(n, 0);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "date,category,product,sales,profit,customers,region,margin\n"
        );
    }

    #[test]
    fn test_csv_export_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(export_file_name(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));

        export_to_path(&path, &records()).unwrap();
        let loaded = crate::data::loader::load_file(&path).unwrap();
        assert_eq!(loaded.records, records());
    }
}
