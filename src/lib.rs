pub mod aggregate;
pub mod clean;
pub mod cli;
pub mod data;
pub mod error;
pub mod features;
pub mod io_utils;
pub mod loader;
pub mod outliers;
pub mod pipeline;
pub mod record;
pub mod store;
pub mod table;

use std::{env, fs, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sales_etl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => handle_run(&args),
        Commands::Preview(args) => handle_preview(&args),
    }
}

fn handle_run(args: &cli::RunArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    info!(
        "Processing '{}' -> '{}' (delimiter '{}')",
        args.input.display(),
        args.database.display(),
        io_utils::printable_delimiter(delimiter)
    );
    let report = pipeline::run_pipeline(&args.input, delimiter, args.limit, &args.database)
        .with_context(|| format!("Running pipeline on {:?}", args.input))?;
    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report).context("Serializing run report")?;
        fs::write(path, json).with_context(|| format!("Writing run report to {path:?}"))?;
        info!("Run report written to {:?}", path);
    }
    info!(
        "Run complete: {} transaction(s) persisted, {} dropped, {} outlier(s)",
        report.transactions, report.rows_dropped, report.outliers
    );
    Ok(())
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let (records, _, _) = pipeline::build_results(&args.input, delimiter, None)
        .with_context(|| format!("Previewing {:?}", args.input))?;

    let headers = [
        "transaction_id",
        "date",
        "category",
        "product",
        "quantity",
        "price",
        "total_sales",
        "day_of_week",
        "high_volume",
        "z_score",
        "outlier",
    ]
    .map(str::to_string)
    .to_vec();
    let rows: Vec<Vec<String>> = records
        .iter()
        .take(args.rows)
        .map(|record| {
            vec![
                record.transaction_id.clone().unwrap_or_default(),
                record.date.format("%Y-%m-%d").to_string(),
                record.category.clone(),
                record.product.clone(),
                format_number(record.quantity),
                format_number(record.price),
                format_number(record.total_sales),
                record.day_of_week.clone(),
                record.high_volume.to_string(),
                format_number(record.z_score),
                record.outlier.to_string(),
            ]
        })
        .collect();

    table::print_table(&headers, &rows);
    info!("Displayed {} record(s) from {:?}", rows.len(), args.input);
    Ok(())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}
