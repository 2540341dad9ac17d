//! Process command - extract fields from a single pay statement.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use paystub_core::extract::StatementParser;

use super::ingest::Ingestor;
use super::output::{format_records, OutputFormat};
use super::{build_parser, load_config, parse_target_month, TargetMonth};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (text, PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// OCR model directory (default: from config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Never run OCR; use the PDF text layer only
    #[arg(long)]
    text_only: bool,

    /// Keep the record only if it was paid in this month (YYYY-MM)
    #[arg(long, value_parser = parse_target_month)]
    target_month: Option<TargetMonth>,

    /// Print consistency warnings for the record
    #[arg(long)]
    validate: bool,

    /// Print how net pay was resolved and timings
    #[arg(long)]
    show_details: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Reading document...");
    let ingestor = Ingestor::new(config.clone(), args.model_dir.clone(), args.text_only);
    let ingested = ingestor.read(&args.input)?;

    pb.set_message("Extracting fields...");
    let parser = build_parser(&config)?;
    let result = parser.parse(&ingested.text)?;

    pb.finish_and_clear();

    let mut records = vec![result.statement.clone()];
    if let Some(month) = args.target_month {
        if !month.contains(&result.statement) {
            warn!(
                "Pay date '{}' is not in {}, skipping {}",
                result.statement.pay_date,
                month,
                args.input.display()
            );
            records.clear();
        }
    }

    if args.validate && !result.warnings.is_empty() {
        eprintln!("{}", style("Validation issues:").yellow());
        for issue in &result.warnings {
            eprintln!("  - {}", issue);
        }
    }

    let output = format_records(&records, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_details {
        eprintln!();
        eprintln!("{} Text source: {}", style("ℹ").blue(), ingested.origin);
        eprintln!("{} Net pay resolved by: {:?}", style("ℹ").blue(), result.net_source);
        eprintln!(
            "{} Extraction time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
