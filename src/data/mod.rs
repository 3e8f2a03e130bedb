/// Data layer: core types, loading, filtering, aggregation and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet        (missing → sample)
///        │                               │
///        ▼                               ▼
///   ┌──────────┐                   ┌──────────┐
///   │  loader   │  parse file       │  sample   │  synthetic month
///   └──────────┘                   └──────────┘
///        │                               │
///        ▼                               ▼
///   ┌──────────────┐
///   │ SalesDataset  │  Vec<SalesRecord>, filter options, date bounds
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date / category / region predicate → visible indices
///   └──────────┘
///        │
///        ├──────────────► aggregate   KPIs, group-bys, tables
///        └──────────────► export      CSV / Parquet of the visible rows
/// ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod sample;
