//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod ingest;
pub mod output;
pub mod process;

use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, Level};

use paystub_core::extract::PaystubParser;
use paystub_core::models::config::PaystubConfig;
use paystub_core::models::statement::PayStatement;

/// Load the config given with `--config`, else the user config file if it
/// exists, else defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PaystubConfig> {
    if let Some(path) = path {
        return PaystubConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        PaystubConfig::from_file(&default_path)
            .with_context(|| format!("failed to read config {}", default_path.display()))
    } else {
        Ok(PaystubConfig::default())
    }
}

/// Build the parser, tracing net pay candidates when asked to in the config
/// or when running at trace verbosity.
pub fn build_parser(config: &PaystubConfig) -> anyhow::Result<PaystubParser> {
    let trace = config.extraction.trace_candidates || tracing::enabled!(Level::TRACE);
    Ok(PaystubParser::from_config(&config.extraction)?.with_trace_candidates(trace))
}

/// A calendar month given as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetMonth {
    pub year: i32,
    pub month: u32,
}

impl TargetMonth {
    /// Whether the record was paid in this month.
    pub fn contains(&self, statement: &PayStatement) -> bool {
        statement.is_paid_in(self.year, self.month)
    }
}

impl std::fmt::Display for TargetMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Clap value parser for `--target-month`.
pub fn parse_target_month(value: &str) -> Result<TargetMonth, String> {
    use chrono::Datelike;

    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map(|date| TargetMonth {
            year: date.year(),
            month: date.month(),
        })
        .map_err(|_| format!("expected YYYY-MM, got '{}'", value))
}
