use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::config::{ConfigOverrides, MissingFieldPolicy};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Vouch a listing against supporting documents",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate every listing row against the supporting documents
    Validate(ValidateArgs),
    /// Concatenate supporting documents into one table
    Combine(CombineArgs),
    /// Preview the first rows of a listing or supporting document
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Delimiter for CSV/TSV sources (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of text sources (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Listing file assumed to be correct (Excel, CSV or JSON)
    #[arg(short = 'l', long = "listing")]
    pub listing: PathBuf,
    /// Supporting document files (CSV, JSON or Excel); repeatable
    #[arg(short = 's', long = "support", required = true, action = clap::ArgAction::Append)]
    pub supports: Vec<PathBuf>,
    /// Destination for the validation table ('-' for stdout)
    #[arg(short = 'o', long = "output", default_value = crate::export::DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,
    /// YAML file with field names and matching rules
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub rules: RuleArgs,
    #[command(flatten)]
    pub source: SourceArgs,
    /// Also print the first N validated rows as a table
    #[arg(long = "preview")]
    pub preview: Option<usize>,
}

#[derive(Debug, Args)]
pub struct RuleArgs {
    /// Field holding the business key
    #[arg(long = "key-field")]
    pub key_field: Option<String>,
    /// Field holding the amount to compare
    #[arg(long = "amount-field")]
    pub amount_field: Option<String>,
    /// Field holding the document date
    #[arg(long = "date-field")]
    pub date_field: Option<String>,
    /// Largest absolute amount difference still considered a match
    #[arg(long = "amount-tolerance")]
    pub amount_tolerance: Option<Decimal>,
    /// Worksheet to read when the listing is a workbook
    #[arg(long = "listing-sheet")]
    pub listing_sheet: Option<String>,
    /// Read ambiguous dates such as 05/01/2024 as day/month/year
    #[arg(long = "day-first")]
    pub day_first: bool,
    /// What to do when a row lacks a field needed for comparison
    #[arg(long = "on-missing-field", value_enum)]
    pub on_missing_field: Option<MissingFieldPolicy>,
}

impl RuleArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            key_field: self.key_field.clone(),
            amount_field: self.amount_field.clone(),
            date_field: self.date_field.clone(),
            amount_tolerance: self.amount_tolerance,
            listing_sheet: self.listing_sheet.clone(),
            day_first: self.day_first,
            on_missing_field: self.on_missing_field,
        }
    }
}

#[derive(Debug, Args)]
pub struct CombineArgs {
    /// Supporting document files to concatenate; repeatable
    #[arg(short = 's', long = "support", required = true, action = clap::ArgAction::Append)]
    pub supports: Vec<PathBuf>,
    /// Destination CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// File to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Worksheet to read for workbooks (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    #[command(flatten)]
    pub source: SourceArgs,
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
