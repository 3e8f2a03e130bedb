use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rand::Rng;

use super::model::{customers_from_f64, parse_date, DataSource, RawRecord, SalesDataset, SalesRecord};
use super::sample::generate_sample_data;
use crate::error::DataError;

/// Columns every source file must provide. Anything else is ignored.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "date",
    "category",
    "product",
    "sales",
    "profit",
    "customers",
    "region",
];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a sales dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the required columns
/// * `.json`    – `[{ "date": "2024-01-01", "category": ..., ... }, ...]`
/// * `.parquet` – flat columns; `date` may be a date, timestamp or string
pub fn load_file(path: &Path) -> Result<SalesDataset> {
    if !path.exists() {
        return Err(DataError::NotFound(path.to_path_buf()).into());
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(DataError::UnsupportedExtension(other.to_string()).into()),
    };

    Ok(SalesDataset::from_records(
        records,
        DataSource::File(path.to_path_buf()),
    ))
}

/// Result of [`load_or_sample`]: the dataset plus the warning to surface
/// when the source file was missing.
#[derive(Debug)]
pub struct LoadOutcome {
    pub dataset: SalesDataset,
    pub warning: Option<String>,
}

/// Load `path`, or fall back to generated sample data when it does not
/// exist. Any other failure is returned unchanged.
pub fn load_or_sample<R: Rng>(path: &Path, rng: &mut R) -> Result<LoadOutcome> {
    match load_file(path) {
        Ok(dataset) => {
            log::info!(
                "Loaded {} records from {}",
                dataset.len(),
                path.display()
            );
            Ok(LoadOutcome {
                dataset,
                warning: None,
            })
        }
        Err(e) if matches!(e.downcast_ref::<DataError>(), Some(DataError::NotFound(_))) => {
            let warning = format!(
                "{} not found, showing generated sample data",
                path.display()
            );
            log::warn!("{warning}");
            Ok(LoadOutcome {
                dataset: generate_sample_data(rng),
                warning: Some(warning),
            })
        }
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<SalesRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;

    let headers = reader.headers().context("reading CSV headers")?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(DataError::MissingColumn(col).into());
        }
    }

    let mut records = Vec::new();
    let mut row = csv::StringRecord::new();
    while reader.read_record(&mut row).context("reading CSV record")? {
        let line = row.position().map_or(0, |p| p.line());
        let raw: RawRecord = row
            .deserialize(Some(&headers))
            .with_context(|| format!("CSV line {line}"))?;
        records.push(SalesRecord::from(raw));
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient="records")`.
/// Dates may be ISO strings or epoch milliseconds.
fn load_json(path: &Path) -> Result<Vec<SalesRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<RawRecord> = serde_json::from_str(&text).context("parsing JSON records")?;
    Ok(rows.into_iter().map(SalesRecord::from).collect())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas or Polars.
///
/// Every column is cast to the type the record needs: strings to Utf8,
/// amounts and counts to Float64, and `date` to Date32 (strings go through
/// [`parse_date`] instead, so timestamps with a time part are accepted).
fn load_parquet(path: &Path) -> Result<Vec<SalesRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let first = records.len();
        read_batch(&batch, first, &mut records)
            .with_context(|| format!("parquet batch starting at record {first}"))?;
    }
    Ok(records)
}

/// Append the rows of `batch` to `out`. `first` is the file-wide index of
/// the batch's first row, used in error messages.
fn read_batch(batch: &RecordBatch, first: usize, out: &mut Vec<SalesRecord>) -> Result<()> {
    let column = |name: &'static str| -> Result<ArrayRef> {
        batch
            .column_by_name(name)
            .cloned()
            .ok_or_else(|| DataError::MissingColumn(name).into())
    };

    let dates = DateColumn::new(column("date")?)?;
    let category = cast_column(&column("category")?, "category", &DataType::Utf8)?;
    let product = cast_column(&column("product")?, "product", &DataType::Utf8)?;
    let region = cast_column(&column("region")?, "region", &DataType::Utf8)?;
    let sales = cast_column(&column("sales")?, "sales", &DataType::Float64)?;
    let profit = cast_column(&column("profit")?, "profit", &DataType::Float64)?;
    let customers = cast_column(&column("customers")?, "customers", &DataType::Float64)?;

    let category = category.as_string::<i32>();
    let product = product.as_string::<i32>();
    let region = region.as_string::<i32>();
    let sales = sales.as_primitive::<Float64Type>();
    let profit = profit.as_primitive::<Float64Type>();
    let customers = customers.as_primitive::<Float64Type>();

    for row in 0..batch.num_rows() {
        let record = first + row;
        out.push(SalesRecord::new(
            dates.value(row, record)?,
            string_at(category, "category", row, record)?,
            string_at(product, "product", row, record)?,
            f64_at(sales, "sales", row, record)?,
            f64_at(profit, "profit", row, record)?,
            customers_from_f64(f64_at(customers, "customers", row, record)?),
            string_at(region, "region", row, record)?,
        ));
    }
    Ok(())
}

fn cast_column(col: &ArrayRef, name: &'static str, to: &DataType) -> Result<ArrayRef> {
    cast(col, to).map_err(|_| {
        DataError::UnsupportedColumnType {
            column: name,
            data_type: format!("{:?}", col.data_type()),
        }
        .into()
    })
}

fn string_at<'a>(
    arr: &'a StringArray,
    column: &'static str,
    row: usize,
    record: usize,
) -> Result<&'a str, DataError> {
    if arr.is_null(row) {
        return Err(DataError::NullValue { column, row: record });
    }
    Ok(arr.value(row))
}

fn f64_at(
    arr: &Float64Array,
    column: &'static str,
    row: usize,
    record: usize,
) -> Result<f64, DataError> {
    if arr.is_null(row) {
        return Err(DataError::NullValue { column, row: record });
    }
    Ok(arr.value(row))
}

/// The `date` column, either already temporal (cast to Date32) or text.
enum DateColumn {
    Days(ArrayRef),
    Text(ArrayRef),
}

impl DateColumn {
    fn new(col: ArrayRef) -> Result<Self> {
        match col.data_type() {
            DataType::Utf8 | DataType::LargeUtf8 => {
                Ok(DateColumn::Text(cast_column(&col, "date", &DataType::Utf8)?))
            }
            _ => Ok(DateColumn::Days(cast_column(&col, "date", &DataType::Date32)?)),
        }
    }

    fn value(&self, row: usize, record: usize) -> Result<NaiveDate> {
        let date = match self {
            DateColumn::Days(arr) => {
                let days = arr.as_primitive::<Date32Type>();
                if days.is_null(row) {
                    return Err(DataError::NullValue { column: "date", row: record }.into());
                }
                days.value_as_date(row)
                    .ok_or_else(|| DataError::InvalidDate(days.value(row).to_string()))
            }
            DateColumn::Text(arr) => {
                let s = string_at(arr.as_string::<i32>(), "date", row, record)?;
                parse_date(s).ok_or_else(|| DataError::InvalidDate(s.to_string()))
            }
        };
        date.with_context(|| format!("record {record}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Int64Array, TimestampMillisecondArray};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    const CSV: &str = "\
date,category,product,sales,profit,customers,region,margin
2024-01-01,Home,Oven,1000,300,20,North,99.0
2024-01-02,Clothing,Shoes,2000,512,41,South,1.0
";

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_csv_recomputes_margin() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", CSV);

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].margin, 30.0);
        assert_eq!(ds.records[1].margin, 25.6);
        assert_eq!(ds.records[1].customers, 41);
        assert_eq!(ds.source, DataSource::File(path));
    }

    #[test]
    fn test_load_csv_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            "date,category,product,sales,profit,region\n2024-01-01,Home,Oven,1,1,North\n",
        );

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::MissingColumn("customers"))
        ));
    }

    #[test]
    fn test_load_csv_bad_row_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            "date,category,product,sales,profit,customers,region\nyesterday,Home,Oven,1,1,1,North\n",
        );

        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("CSV line 2"));
    }

    #[test]
    fn test_load_json_records() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.json",
            r#"[
                {"date": "2024-01-03T00:00:00.000", "category": "Home", "product": "Oven",
                 "sales": 1000, "profit": 250, "customers": 20, "region": "North"},
                {"date": 1704067200000, "category": "Home", "product": "TV",
                 "sales": 500.0, "profit": 100.0, "customers": 9.0, "region": "South"}
            ]"#,
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(ds.records[1].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(ds.records[1].margin, 20.0);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.xlsx", "");

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::UnsupportedExtension(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_sample() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        let mut rng = StdRng::seed_from_u64(3);

        let outcome = load_or_sample(&path, &mut rng).unwrap();
        assert!(!outcome.dataset.is_empty());
        assert_eq!(outcome.dataset.source, DataSource::Sample);
        assert!(outcome.warning.unwrap().contains("not found"));
    }

    #[test]
    fn test_other_errors_do_not_fall_back() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", "date,category\n2024-01-01,Home\n");
        let mut rng = StdRng::seed_from_u64(3);

        assert!(load_or_sample(&path, &mut rng).is_err());
    }

    #[test]
    fn test_parquet_round_trip_through_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.parquet");
        let mut rng = StdRng::seed_from_u64(11);
        let sample = generate_sample_data(&mut rng);
        let all: Vec<usize> = (0..sample.len()).collect();

        crate::data::export::write_parquet(&path, sample.select(&all)).unwrap();
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.records, sample.records);
    }

    fn write_parquet_columns(
        path: &Path,
        date: ArrayRef,
        category: Vec<Option<&str>>,
        sales: Vec<Option<f64>>,
    ) {
        let n = sales.len();
        let schema = Arc::new(Schema::new(vec![
            Field::new("date", date.data_type().clone(), true),
            Field::new("category", DataType::Utf8, true),
            Field::new("product", DataType::Utf8, true),
            Field::new("sales", DataType::Float64, true),
            Field::new("profit", DataType::Float64, true),
            Field::new("customers", DataType::Int64, true),
            Field::new("region", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                date,
                Arc::new(StringArray::from(category)),
                Arc::new(StringArray::from(vec!["Oven"; n])),
                Arc::new(Float64Array::from(sales)),
                Arc::new(Float64Array::from(vec![100.0; n])),
                Arc::new(Int64Array::from(vec![10_i64; n])),
                Arc::new(StringArray::from(vec!["North"; n])),
            ],
        )
        .unwrap();

        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    fn text_dates(dates: Vec<&str>) -> ArrayRef {
        Arc::new(StringArray::from(dates))
    }

    #[test]
    fn test_parquet_text_dates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.parquet");
        write_parquet_columns(
            &path,
            text_dates(vec!["2024-01-02 00:00:00", "2024-01-05"]),
            vec![Some("Home"), Some("Home")],
            vec![Some(400.0), Some(500.0)],
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(ds.records[1].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(ds.records[0].margin, 25.0);
    }

    #[test]
    fn test_parquet_timestamp_dates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.parquet");
        // 2024-01-02T00:00:00Z and 2024-01-03T13:30:00Z
        let stamps = TimestampMillisecondArray::from(vec![1_704_153_600_000_i64, 1_704_288_600_000]);
        write_parquet_columns(
            &path,
            Arc::new(stamps),
            vec![Some("Home"), Some("Home")],
            vec![Some(400.0), Some(500.0)],
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(
            ds.date_bounds,
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            ))
        );
    }

    #[test]
    fn test_parquet_null_amount_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.parquet");
        write_parquet_columns(
            &path,
            text_dates(vec!["2024-01-02", "2024-01-03"]),
            vec![Some("Home"), Some("Home")],
            vec![Some(100.0), None],
        );

        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing value in column 'sales' at record 1"));
    }

    #[test]
    fn test_parquet_null_category_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.parquet");
        write_parquet_columns(
            &path,
            text_dates(vec!["2024-01-02", "2024-01-03"]),
            vec![None, Some("Home")],
            vec![Some(100.0), Some(200.0)],
        );

        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing value in column 'category' at record 0"));
    }
}
