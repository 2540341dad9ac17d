//! Rendering records as JSON, CSV or a text summary.

use paystub_core::models::statement::PayStatement;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON array of records
    Json,
    /// CSV with one row per record
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Render records in the requested format.
///
/// JSON is always an array, even for one record or none.
pub fn format_records(records: &[PayStatement], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => format_csv(records),
        OutputFormat::Text => Ok(records.iter().map(format_text).collect::<Vec<_>>().join("\n")),
    }
}

fn format_csv(records: &[PayStatement]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(statement: &PayStatement) -> String {
    let mut output = String::new();

    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    output.push_str(&format!("Pay date:   {}\n", or_dash(&statement.pay_date)));
    output.push_str(&format!("Pay period: {}\n", or_dash(&statement.pay_period)));
    output.push('\n');

    output.push_str(&format!("  Gross:      {:>12}\n", statement.gross_amount.to_string()));
    output.push_str(&format!("  Taxes:      {:>12}\n", statement.total_taxes().to_string()));
    output.push_str(&format!("  Deductions: {:>12}\n", statement.total_deductions().to_string()));
    output.push_str(&format!("  Net:        {:>12}\n", statement.net_amount.to_string()));
    output.push('\n');

    let lines = [
        ("Federal tax", statement.federal_tax_amount),
        ("State tax", statement.state_tax_amount),
        ("Social Security", statement.social_security_amount),
        ("Medicare", statement.medicare_amount),
        ("401k employee", statement.employee_401k_contribution),
        ("401k employer match", statement.employer_401k_match),
        ("HSA employee", statement.employee_hsa_contribution),
        ("HSA employer match", statement.employer_hsa_match),
        ("FSA employee", statement.employee_fsa_contribution),
        ("FSA employer match", statement.employer_fsa_match),
        ("Health insurance", statement.health_insurance),
        ("Dental insurance", statement.dental_insurance),
        ("Vision insurance", statement.vision_insurance),
    ];
    for (label, value) in lines.iter().filter(|(_, v)| !v.is_zero()) {
        output.push_str(&format!("  {:<20} {:>12}\n", label, value.to_string()));
    }

    output
}
