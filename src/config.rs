use std::path::PathBuf;

use clap::Parser;

/// Interactive sales analytics dashboard.
#[derive(Debug, Clone, Parser)]
#[command(name = "sales-dashboard", version, about)]
pub struct Args {
    /// Sales data to load (.csv, .json or .parquet). When the file does not
    /// exist a month of sample data is generated instead.
    #[arg(short, long, default_value = "data.csv")]
    pub data: PathBuf,

    /// Directory the export dialog opens in.
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Seed for the generated sample data.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["sales-dashboard"]);
        assert_eq!(args.data, PathBuf::from("data.csv"));
        assert!(args.export_dir.is_none());
        assert!(args.seed.is_none());
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "sales-dashboard",
            "--data",
            "sales.parquet",
            "--export-dir",
            "/tmp/out",
            "--seed",
            "42",
        ]);
        assert_eq!(args.data, PathBuf::from("sales.parquet"));
        assert_eq!(args.export_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(args.seed, Some(42));
    }
}
