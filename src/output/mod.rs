mod cli;
mod json;

pub use cli::print_cli_table;
pub use json::print_json;

use crate::model::Report;
use anyhow::Result;

/// Output format for scan reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'table' or 'json'", s)),
        }
    }
}

pub fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_cli_table(report),
        OutputFormat::Json => print_json(report),
    }
}

/// Format report to string for file output
pub fn format_report(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        // Table output is terminal-oriented; files always get JSON.
        OutputFormat::Table | OutputFormat::Json => {
            Ok(serde_json::to_string_pretty(report)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PackageResult, Report};

    #[test]
    fn test_format_from_str() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_report_is_json() {
        let report = Report::from_results(vec![PackageResult::new("a", "1.0.0", vec![])]);
        let out = format_report(&report, OutputFormat::Json).unwrap();
        assert!(out.contains("\"summary\""));
        assert!(out.contains("\"total\": 1"));
    }
}
