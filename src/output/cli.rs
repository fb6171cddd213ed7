use crate::model::{Report, Severity};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct VulnRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Declared")]
    declared: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "CVE")]
    cve: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Affected")]
    affected: String,
}

pub fn print_cli_table(report: &Report) -> Result<()> {
    println!();
    println!(
        "Scan completed at: {}",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    if report.vulnerabilities.is_empty() {
        println!(
            "No vulnerabilities found in {} packages.",
            report.summary.total
        );
        return Ok(());
    }

    let mut rows: Vec<(Severity, VulnRow)> = Vec::new();
    for result in &report.vulnerabilities {
        for record in &result.advisories {
            rows.push((
                record.severity,
                VulnRow {
                    severity: format_severity(record.severity),
                    package: result.name.clone(),
                    declared: result.version.clone(),
                    id: record.id.clone(),
                    cve: record.cve.clone().unwrap_or_else(|| "-".to_string()),
                    title: truncate(&record.title, 50),
                    affected: truncate(&record.vulnerable_versions, 30),
                },
            ));
        }
    }
    rows.sort_by(|a, b| b.0.cmp(&a.0));

    let table = Table::new(rows.into_iter().map(|(_, row)| row))
        .with(Style::rounded())
        .to_string();
    println!("{}", table);

    println!();
    print_summary(report);

    Ok(())
}

fn print_summary(report: &Report) {
    let s = &report.summary;
    println!(
        "Summary: {} packages scanned, {} vulnerable",
        s.total, s.vulnerable
    );
    println!(
        "  critical: {}  high: {}  moderate: {}  low: {}  info: {}",
        s.critical, s.high, s.moderate, s.low, s.info
    );
}

fn format_severity(severity: Severity) -> String {
    severity.as_str().to_uppercase()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
