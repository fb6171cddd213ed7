use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use depscan::{
    config::Config,
    model::{DependencySet, Report, Severity},
    output::{format_report, print_report, OutputFormat},
    ScanConfig, Scanner,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const CRITICAL_VULN: u8 = 2;
    pub const HIGH_VULN: u8 = 3;
    pub const MODERATE_VULN: u8 = 4;
    pub const LOW_VULN: u8 = 5;
}

#[derive(Parser)]
#[command(name = "depscan")]
#[command(
    author,
    version,
    about = "Scan declared dependencies for known vulnerabilities"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a dependency manifest for vulnerabilities
    Scan {
        /// Path to a JSON manifest: either a flat {"name": "constraint"} map
        /// or a package.json-shaped document
        file: PathBuf,

        /// Package ecosystem to match against (npm, PyPI, crates.io, ...)
        #[arg(short, long)]
        ecosystem: Option<String>,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the JSON report to a file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum concurrent advisory queries
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-query timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Exit with error if vulnerabilities at or above this severity are found
        #[arg(long, value_enum)]
        fail_on: Option<FailLevel>,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FailLevel {
    Critical,
    High,
    Moderate,
    Low,
}

impl FailLevel {
    fn threshold(self) -> Severity {
        match self {
            FailLevel::Critical => Severity::Critical,
            FailLevel::High => Severity::High,
            FailLevel::Moderate => Severity::Moderate,
            FailLevel::Low => Severity::Low,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            file,
            ecosystem,
            format,
            output,
            concurrency,
            timeout,
            fail_on,
        } => {
            let format_str = format.unwrap_or_else(|| config.default_format.clone());

            let mut scan_config = config.to_scan_config();
            if let Some(ecosystem) = ecosystem {
                scan_config.ecosystem = ecosystem;
            }
            if let Some(concurrency) = concurrency {
                scan_config.concurrency = concurrency;
            }
            if let Some(secs) = timeout {
                scan_config.timeout = Duration::from_secs(secs);
            }

            run_scan(&file, scan_config, format_str, output, fail_on).await
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    file: &Path,
    scan_config: ScanConfig,
    format: String,
    output_file: Option<PathBuf>,
    fail_on: Option<FailLevel>,
) -> Result<u8> {
    let format = OutputFormat::from_str(&format).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table && output_file.is_none();

    let deps = load_dependency_set(file)?;

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Checking {} packages for vulnerabilities...", deps.len()));
        Some(pb)
    } else {
        None
    };

    let scanner = Scanner::new(scan_config);
    let report = scanner.scan(&deps).await?;

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Found {} vulnerable packages",
            report.summary.vulnerable
        ));
    }

    if let Some(path) = output_file {
        let rendered = format_report(&report, format)?;
        std::fs::write(&path, rendered)?;
        println!("Report written to: {}", path.display());
    } else {
        print_report(&report, format)?;
    }

    Ok(determine_exit_code(&report, fail_on))
}

/// Loads the dependency mapping from a local JSON file.
///
/// Accepts either a flat `{"name": "constraint"}` object or a
/// package.json-shaped document, merging `dependencies` and
/// `devDependencies` (regular dependencies win on duplicates).
fn load_dependency_set(path: &Path) -> Result<DependencySet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Manifest is not valid JSON: {}", path.display()))?;

    let object = value
        .as_object()
        .context("Manifest must be a JSON object")?;

    let sections: Vec<&serde_json::Map<String, serde_json::Value>> =
        if object.contains_key("dependencies") || object.contains_key("devDependencies") {
            ["dependencies", "devDependencies"]
                .iter()
                .filter_map(|key| object.get(*key).and_then(|v| v.as_object()))
                .collect()
        } else {
            vec![object]
        };

    let pairs = sections.into_iter().flatten().filter_map(|(name, value)| {
        value
            .as_str()
            .map(|constraint| (name.clone(), constraint.to_string()))
    });

    Ok(DependencySet::from_pairs(pairs))
}

fn determine_exit_code(report: &Report, fail_on: Option<FailLevel>) -> u8 {
    let Some(level) = fail_on else {
        return exit_codes::SUCCESS;
    };

    let worst = report
        .vulnerabilities
        .iter()
        .filter_map(|r| r.highest_severity)
        .max();

    match worst {
        Some(severity) if severity >= level.threshold() => match severity {
            Severity::Critical => exit_codes::CRITICAL_VULN,
            Severity::High => exit_codes::HIGH_VULN,
            Severity::Moderate => exit_codes::MODERATE_VULN,
            Severity::Low => exit_codes::LOW_VULN,
            Severity::Info => exit_codes::SUCCESS,
        },
        _ => exit_codes::SUCCESS,
    }
}

fn handle_config(init: bool, path: bool) -> Result<()> {
    if path {
        println!("{}", Config::config_path().display());
        return Ok(());
    }

    if init {
        let config = Config::default();
        config.save()?;
        println!("Config file created at: {}", Config::config_path().display());
        return Ok(());
    }

    println!("{}", Config::generate_default_config());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depscan::model::PackageResult;
    use std::io::Write;

    fn manifest_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_flat_manifest() {
        let file = manifest_file(r#"{"lodash": "^4.17.0", "express": "~4.18.2"}"#);
        let deps = load_dependency_set(file.path()).unwrap();
        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn test_load_package_json_manifest() {
        let file = manifest_file(
            r#"{
                "name": "my-app",
                "dependencies": {"lodash": "^4.17.0"},
                "devDependencies": {"jest": "^29.0.0", "lodash": "^3.0.0"}
            }"#,
        );
        let deps = load_dependency_set(file.path()).unwrap();
        assert_eq!(deps.len(), 2);
        // the regular dependency entry wins over the dev entry
        let lodash = deps.iter().find(|d| d.name == "lodash").unwrap();
        assert_eq!(lodash.constraint, "^4.17.0");
    }

    #[test]
    fn test_load_manifest_skips_non_string_constraints() {
        let file = manifest_file(r#"{"name": "my-app", "version": 3, "lodash": "^4.17.0"}"#);
        let deps = load_dependency_set(file.path()).unwrap();
        assert_eq!(deps.len(), 2); // "name" and "lodash"; numeric value skipped
    }

    #[test]
    fn test_load_rejects_non_object() {
        let file = manifest_file(r#"["lodash"]"#);
        assert!(load_dependency_set(file.path()).is_err());
    }

    fn report_with(severity: Option<Severity>) -> Report {
        let advisories = severity
            .map(|s| {
                vec![depscan::model::VulnerabilityRecord {
                    id: "GHSA-test".to_string(),
                    package: "a".to_string(),
                    title: "t".to_string(),
                    cve: None,
                    vulnerable_versions: "<1".to_string(),
                    source: "OSV.dev".to_string(),
                    reported: None,
                    severity: s,
                    reference: None,
                }]
            })
            .unwrap_or_default();
        Report::from_results(vec![PackageResult::new("a", "1.0.0", advisories)])
    }

    #[test]
    fn test_exit_code_without_fail_on() {
        let report = report_with(Some(Severity::Critical));
        assert_eq!(determine_exit_code(&report, None), exit_codes::SUCCESS);
    }

    #[test]
    fn test_exit_code_at_threshold() {
        let report = report_with(Some(Severity::High));
        assert_eq!(
            determine_exit_code(&report, Some(FailLevel::High)),
            exit_codes::HIGH_VULN
        );
        assert_eq!(
            determine_exit_code(&report, Some(FailLevel::Critical)),
            exit_codes::SUCCESS
        );
    }

    #[test]
    fn test_exit_code_clean_report() {
        let report = report_with(None);
        assert_eq!(
            determine_exit_code(&report, Some(FailLevel::Low)),
            exit_codes::SUCCESS
        );
    }
}
