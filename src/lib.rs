pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod ingest;
pub mod io_utils;
pub mod matcher;
pub mod preview;
pub mod table;
pub mod unify;
pub mod validate;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, SourceArgs},
    config::VouchConfig,
    ingest::IngestOptions,
    matcher::MatchRules,
    table::normalize_headers,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("doc_vouch", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => handle_validate(&args),
        Commands::Combine(args) => handle_combine(&args),
        Commands::Preview(args) => handle_preview(&args),
    }
}

fn ingest_options(source: &SourceArgs) -> Result<IngestOptions> {
    let encoding = io_utils::resolve_encoding(source.input_encoding.as_deref())?;
    if let Some(delimiter) = source.delimiter {
        debug!("Using delimiter '{}'", printable_delimiter(delimiter));
    }
    Ok(IngestOptions {
        delimiter: source.delimiter,
        encoding,
        sheet: None,
    })
}

fn load_config(args: &cli::ValidateArgs) -> Result<VouchConfig> {
    let mut config = match &args.config {
        Some(path) => VouchConfig::load(path)?,
        None => VouchConfig::default(),
    };
    config.apply_overrides(&args.rules.overrides());
    config.validate()?;
    debug!("Effective configuration: {config:?}");
    Ok(config)
}

fn handle_validate(args: &cli::ValidateArgs) -> Result<()> {
    if args.preview.is_some() && io_utils::is_dash(&args.output) {
        bail!("--preview cannot be combined with --output -");
    }
    let config = load_config(args)?;
    let options = ingest_options(&args.source)?;

    let listing = ingest::load_table(
        &args.listing,
        &options.with_sheet(Some(config.listing_sheet.clone())),
    )
    .with_context(|| format!("Loading listing {:?}", args.listing))?;
    let listing = normalize_headers(listing);
    info!("Loaded {} listing row(s) from {:?}", listing.len(), args.listing);

    let support = unify::collect_supporting(&args.supports, &options)?;
    info!(
        "Combined {} supporting row(s) from {} document(s), {} skipped",
        support.table.len(),
        support.included.len(),
        support.skipped.len()
    );

    let rules = MatchRules::from(&config);
    let result = validate::validate(&listing, &support.table, &rules, config.on_missing_field)?;
    export::export_table(&result.table, Some(args.output.as_path()))
        .with_context(|| format!("Writing validation table to {:?}", args.output))?;
    info!("Validation table written to {:?}", args.output);

    if let Some(rows) = args.preview {
        preview::print_preview(&result.table, rows);
    }
    Ok(())
}

fn handle_combine(args: &cli::CombineArgs) -> Result<()> {
    let options = ingest_options(&args.source)?;
    let support = unify::collect_supporting(&args.supports, &options)?;
    export::export_table(&support.table, args.output.as_deref())
        .context("Writing combined supporting documents")?;
    info!(
        "Wrote {} combined row(s) from {} document(s), {} skipped",
        support.table.len(),
        support.included.len(),
        support.skipped.len()
    );
    Ok(())
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let options = ingest_options(&args.source)?.with_sheet(args.sheet.clone());
    let table = ingest::load_table(&args.input, &options)
        .with_context(|| format!("Loading {:?}", args.input))?;
    let table = normalize_headers(table);
    preview::print_preview(&table, args.rows);
    info!(
        "Displayed {} of {} row(s) from {:?}",
        table.len().min(args.rows),
        table.len(),
        args.input
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
