use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean, analyze, and store sales transaction data", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline: clean, derive, flag outliers, aggregate, persist
    Run(RunArgs),
    /// Run the in-memory stages and print derived records as a table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Input CSV file of raw sales transactions
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// SQLite database file to write result tables into
    #[arg(short = 'd', long = "database")]
    pub database: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Limit number of rows to read (useful for prototyping)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input CSV file of raw sales transactions
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of derived records to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
