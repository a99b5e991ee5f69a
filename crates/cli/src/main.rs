//! # sheetcast-cli
//!
//! Command-line front end: converts PDFs into xlsx workbooks.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use sheetcast_pdf::{
    convert_pdf_with, AlwaysForceOcr, ConvertOptions, Converter, FilenameOcrPolicy,
    JsonOcrService, NeverForceOcr,
};
use sheetcast_sheet::Workbook;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinError;
use tracing_subscriber::EnvFilter;

/// sheetcast - Turn PDF tables into spreadsheets
#[derive(Parser)]
#[command(name = "sheetcast")]
#[command(author, version, about = "Convert PDF tables into xlsx workbooks", long_about = None)]
struct Cli {
    /// PDF files to convert
    #[arg(value_name = "PDF", required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (single input only; defaults to <input>.xlsx)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Stored Textract JSON response to use as OCR result (single input only)
    #[arg(long = "ocr-response", value_name = "JSON")]
    ocr_response: Option<PathBuf>,

    /// Never run OCR; scanned pages only appear in the full-text sheet
    #[arg(long = "no-ocr")]
    no_ocr: bool,

    /// Use OCR for every page, even pages with a text layer
    #[arg(long = "force-ocr", conflicts_with = "no_ocr")]
    force_ocr: bool,

    /// Use OCR for every page of files whose name contains SUBSTR
    #[arg(long = "force-ocr-pattern", value_name = "SUBSTR")]
    force_ocr_patterns: Vec<String>,

    /// Page range to convert, e.g. 2-5 or 3
    #[arg(long = "pages", value_name = "A-B", value_parser = parse_page_range)]
    pages: Option<(usize, usize)>,

    /// Minimum rows of a text-aligned table
    #[arg(long = "min-rows", default_value_t = 2)]
    min_rows: usize,

    /// Minimum columns of a text-aligned table
    #[arg(long = "min-cols", default_value_t = 2)]
    min_cols: usize,

    /// Points within which ruling lines snap together
    #[arg(long = "ruling-tolerance", default_value_t = 3.0)]
    ruling_tolerance: f64,

    /// Print each sheet's name and size
    #[arg(long)]
    summary: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// A converted document.
struct Converted {
    output: PathBuf,
    sheets: Vec<(String, usize, usize)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.inputs.len() > 1 && cli.output.is_some() {
        bail!("--output can only be used with a single input");
    }
    if cli.inputs.len() > 1 && cli.ocr_response.is_some() {
        bail!("--ocr-response can only be used with a single input");
    }

    let converter = Arc::new(build_converter(&cli));
    tracing::info!(documents = cli.inputs.len(), "starting conversion");

    let mut jobs = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        let input = input.clone();
        let output = output_path(&input, cli.output.as_deref());
        let converter = Arc::clone(&converter);
        let handle = tokio::task::spawn_blocking(move || convert_one(&input, &output, &converter));
        jobs.push(handle);
    }

    let mut failed = 0;
    for (input, job) in cli.inputs.iter().zip(jobs) {
        if !report(input, job.await, cli.summary) {
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} of {} documents failed", failed, cli.inputs.len());
    }
    Ok(())
}

fn build_converter(cli: &Cli) -> Converter {
    let options = ConvertOptions {
        page_range: cli.pages,
        ocr_enabled: !cli.no_ocr,
        min_table_rows: cli.min_rows,
        min_table_cols: cli.min_cols,
        ruling_tolerance: cli.ruling_tolerance,
        ..Default::default()
    };

    let ocr = match &cli.ocr_response {
        Some(path) => JsonOcrService::new(path),
        None => JsonOcrService::sidecar(),
    };
    let converter = Converter::new(options).with_ocr(ocr);

    if cli.force_ocr {
        converter.with_policy(AlwaysForceOcr)
    } else if !cli.force_ocr_patterns.is_empty() {
        converter.with_policy(FilenameOcrPolicy::new(&cli.force_ocr_patterns))
    } else {
        converter.with_policy(NeverForceOcr)
    }
}

/// Convert one PDF and write its workbook.
fn convert_one(input: &Path, output: &Path, converter: &Converter) -> Result<Converted> {
    let workbook = convert_pdf_with(input, converter)
        .with_context(|| format!("Failed to convert {}", input.display()))?;
    workbook
        .save_as_xlsx(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(Converted {
        output: output.to_path_buf(),
        sheets: sheet_summary(&workbook),
    })
}

/// Print the outcome of one conversion task; `false` when it failed.
///
/// A panicked task counts as a failed document so the remaining
/// documents are still reported.
fn report(input: &Path, joined: Result<Result<Converted>, JoinError>, summary: bool) -> bool {
    let error = match joined {
        Ok(Ok(converted)) => {
            print_converted(input, &converted, summary);
            return true;
        }
        Ok(Err(e)) => e,
        Err(e) => anyhow!(e).context("Conversion task panicked"),
    };
    tracing::error!(input = %input.display(), "conversion failed");
    eprintln!("{} {}: {:#}", "Error:".red().bold(), input.display(), error);
    false
}

fn sheet_summary(workbook: &Workbook) -> Vec<(String, usize, usize)> {
    workbook
        .iter()
        .map(|sheet| (sheet.name().to_string(), sheet.row_count(), sheet.col_count()))
        .collect()
}

fn print_converted(input: &Path, converted: &Converted, summary: bool) {
    println!(
        "{} {} -> {} ({} sheets)",
        "Converted".green().bold(),
        input.display(),
        converted.output.display(),
        converted.sheets.len()
    );
    if summary {
        for (name, rows, cols) in &converted.sheets {
            println!("  {} {}x{}", name.cyan(), rows, cols);
        }
    }
}

/// `<input stem>.xlsx` next to the input unless an explicit path is given.
fn output_path(input: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("xlsx"),
    }
}

/// Parse `A-B` or a single page `A` into a 1-based inclusive range.
fn parse_page_range(s: &str) -> std::result::Result<(usize, usize), String> {
    let parse = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|_| format!("Invalid page number: '{}'", part.trim()))
    };

    let (start, end) = match s.split_once('-') {
        Some((a, b)) => (parse(a)?, parse(b)?),
        None => {
            let page = parse(s)?;
            (page, page)
        }
    };

    if start == 0 || start > end {
        return Err(format!("Invalid page range '{}': expected A-B with 1 <= A <= B", s));
    }
    Ok((start, end))
}
