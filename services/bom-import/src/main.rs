//! `bom-import` command line entry point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ion_bom_import::{
    run_import, ImportAborted, ImportOptions, InMemoryPartsApi, IonClient, PartsApi,
};
use ion_models::ImportReport;
use ion_utils::{init_logging, BomReader, ImporterConfig, LevelFormat};
use tracing::{error, info, warn};

/// Import a level-indented BOM export into ION
#[derive(Parser, Debug)]
#[command(name = "bom-import", version, about)]
struct Args {
    /// BOM export to import (.csv, .xlsx or .xml)
    file: PathBuf,

    /// Part number of the top-level assembly; defaults to the file name
    #[arg(long)]
    top_level: Option<String>,

    /// How the level column encodes depth
    #[arg(long, value_parser = parse_level_format)]
    level_format: Option<LevelFormat>,

    /// Run against an in-memory ION instead of the configured API
    #[arg(long)]
    dry_run: bool,

    /// Skip the batched lookup of existing parts
    #[arg(long)]
    no_prefetch: bool,

    /// Exit non-zero when any row failed
    #[arg(long)]
    fail_on_errors: bool,
}

fn parse_level_format(raw: &str) -> Result<LevelFormat, String> {
    raw.parse()
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = ImporterConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    let mut reader = BomReader::new()
        .with_level_format(args.level_format.unwrap_or(config.import.level_format));
    let top_level = args.top_level.clone().or_else(|| {
        config
            .import
            .synthesize_root
            .then(|| args.file.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .flatten()
    });
    if let Some(top_level) = top_level {
        reader = reader.with_top_level(top_level);
    }

    let parsed = reader.read_file(&args.file)?;
    for warning in &parsed.parse_warnings {
        warn!("{}", warning);
    }
    info!(
        file = %parsed.filename,
        rows = parsed.total_rows,
        dry_run = args.dry_run,
        "BOM export read"
    );

    let options = ImportOptions {
        prefetch_existing: config.import.prefetch_existing && !args.no_prefetch,
    };
    let api: Box<dyn PartsApi> = if args.dry_run {
        Box::new(InMemoryPartsApi::new())
    } else {
        Box::new(IonClient::new(&config.api)?)
    };

    match run_import(parsed.rows, api, options) {
        Ok(report) => {
            print_report(&report);
            if args.fail_on_errors && report.has_failures() {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Err(ImportAborted { error, partial }) => {
            print_report(&partial);
            error!(code = error.error_code(), "{}", error);
            eprintln!("import aborted: {}", error);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_report(report: &ImportReport) {
    for outcome in &report.outcomes {
        println!("{}", outcome);
    }
    let summary = report.summary();
    println!(
        "{} rows: {} succeeded, {} failed ({} parts created, {} reused, {} links created)",
        summary.total,
        summary.succeeded,
        summary.failed,
        report.parts_created,
        report.parts_reused,
        report.links_created
    );
}
