//! Batch processing command for multiple pay statements.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use paystub_core::extract::rules::NetSource;
use paystub_core::extract::{PaystubParser, StatementParser};
use paystub_core::models::statement::PayStatement;

use super::ingest::{Ingestor, SourceKind};
use super::output::{format_records, OutputFormat};
use super::{build_parser, load_config, parse_target_month, TargetMonth};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input files
    #[arg(required = true)]
    input: String,

    /// Output directory (one file per statement)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also write summary.csv, ordered by pay date
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Keep going when a file fails
    #[arg(long)]
    continue_on_error: bool,

    /// Keep only statements paid in this month (YYYY-MM)
    #[arg(long, value_parser = parse_target_month)]
    target_month: Option<TargetMonth>,

    /// OCR model directory (default: from config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Outcome of one file.
struct FileOutcome {
    path: PathBuf,
    result: Result<Extracted, String>,
    processing_time_ms: u64,
}

struct Extracted {
    statement: PayStatement,
    net_source: NetSource,
    in_target_month: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| SourceKind::from_path(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!("{} Found {} files to process", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let parser = Arc::new(build_parser(&config)?);
    let ingestor = Arc::new(Ingestor::new(config.clone(), args.model_dir.clone(), false));
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let target_month = args.target_month;

    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let permit = semaphore.clone().acquire_owned().await?;
        let parser = Arc::clone(&parser);
        let ingestor = Arc::clone(&ingestor);
        let pb = pb.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let result = process_file(&path, &ingestor, &parser, target_month)
                .map_err(|e| format!("{:#}", e));
            pb.inc(1);

            FileOutcome {
                path,
                result,
                processing_time_ms: file_start.elapsed().as_millis() as u64,
            }
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await?);
    }

    pb.finish_and_clear();

    for outcome in &outcomes {
        if let Err(message) = &outcome.result {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", outcome.path.display(), message);
            } else {
                error!("Failed to process {}: {}", outcome.path.display(), message);
                anyhow::bail!("Processing failed for {}: {}", outcome.path.display(), message);
            }
        }
    }

    if let Some(output_dir) = &args.output_dir {
        for outcome in &outcomes {
            let Ok(extracted) = &outcome.result else {
                continue;
            };
            let records: &[PayStatement] = if extracted.in_target_month {
                std::slice::from_ref(&extracted.statement)
            } else {
                &[]
            };

            let stem = outcome
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("statement");
            let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));

            fs::write(&output_path, format_records(records, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &mut outcomes)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&FileOutcome> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(&o.result, Ok(e) if !e.in_target_month))
        .count();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} outside target month, {} failed",
        style(outcomes.len() - failed.len() - skipped).green(),
        style(skipped).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for outcome in &failed {
            if let Err(message) = &outcome.result {
                eprintln!("  - {}: {}", outcome.path.display(), message);
            }
        }
    }

    Ok(())
}

fn process_file(
    path: &Path,
    ingestor: &Ingestor,
    parser: &PaystubParser,
    target_month: Option<TargetMonth>,
) -> anyhow::Result<Extracted> {
    let ingested = ingestor.read(path)?;
    let result = parser.parse(&ingested.text)?;

    let in_target_month = target_month
        .map(|month| month.contains(&result.statement))
        .unwrap_or(true);
    if !in_target_month {
        debug!(
            "{} paid on '{}', outside target month",
            path.display(),
            result.statement.pay_date
        );
    }

    Ok(Extracted {
        statement: result.statement,
        net_source: result.net_source,
        in_target_month,
    })
}

/// Write one row per file, successful rows ordered by pay date (undated
/// last), failures at the end.
fn write_summary(path: &Path, outcomes: &mut [FileOutcome]) -> anyhow::Result<()> {
    outcomes.sort_by(|a, b| summary_key(a).cmp(&summary_key(b)));

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "filename",
        "status",
        "pay_date",
        "pay_period",
        "gross_amount",
        "net_amount",
        "total_taxes",
        "total_deductions",
        "net_source",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes.iter() {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let elapsed = outcome.processing_time_ms.to_string();

        match &outcome.result {
            Ok(extracted) => {
                let statement = &extracted.statement;
                let status = if extracted.in_target_month {
                    "success"
                } else {
                    "skipped"
                };
                wtr.write_record([
                    filename,
                    status,
                    &statement.pay_date,
                    &statement.pay_period,
                    &statement.gross_amount.to_string(),
                    &statement.net_amount.to_string(),
                    &statement.total_taxes().to_string(),
                    &statement.total_deductions().to_string(),
                    &format!("{:?}", extracted.net_source),
                    &elapsed,
                    "",
                ])?;
            }
            Err(message) => {
                wtr.write_record([
                    filename, "error", "", "", "", "", "", "", "", &elapsed, message,
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

fn summary_key(outcome: &FileOutcome) -> (u8, Option<chrono::NaiveDate>, PathBuf) {
    let rank = match &outcome.result {
        Ok(e) if e.statement.pay_date_parsed().is_some() => 0,
        Ok(_) => 1,
        Err(_) => 2,
    };
    let date = outcome
        .result
        .as_ref()
        .ok()
        .and_then(|e| e.statement.pay_date_parsed());
    (rank, date, outcome.path.clone())
}
