use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sales_dashboard::data::export::export_to_path;
use sales_dashboard::data::sample::generate_sample_data;

/// Write a month of synthetic sales data for the dashboard to load.
#[derive(Debug, Parser)]
#[command(name = "generate_sample", about)]
struct Cli {
    /// Output file; `.parquet` writes Parquet, anything else CSV.
    #[arg(short, long, default_value = "data.csv")]
    output: PathBuf,

    /// Seed for the random generator.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let dataset = generate_sample_data(&mut rng);
    let written = export_to_path(&cli.output, &dataset.records)?;

    let period = dataset
        .date_bounds
        .map(|(first, last)| format!("{first} to {last}"))
        .unwrap_or_default();
    println!(
        "Wrote {written} records ({period}, {} products) to {}",
        dataset.products.len(),
        cli.output.display()
    );
    Ok(())
}
