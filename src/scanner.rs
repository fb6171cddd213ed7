//! The scan engine: bounded fan-out over the dependency set, per-package
//! advisory filtering and classification, order-preserving aggregation.
//!
//! One scan spawns one worker per package, admission-gated by a semaphore so
//! at most `concurrency` advisory queries are in flight at once. Workers own
//! their whole request/response lifecycle and share nothing; each result is
//! tagged with its input index so the report order matches the input order
//! regardless of completion order.
//!
//! # Example
//!
//! ```no_run
//! use depscan::{DependencySet, ScanConfig, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let deps = DependencySet::from_pairs([
//!         ("lodash".to_string(), "^4.17.0".to_string()),
//!     ]);
//!     let report = Scanner::new(ScanConfig::default()).scan(&deps).await?;
//!     println!("{} vulnerable packages", report.summary.vulnerable);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::checker::{default_source, AdvisorySource};
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::model::{Advisory, DependencySet, PackageResult, Report, VulnerabilityRecord};
use crate::{matcher, severity, version};

/// Dependency-vulnerability scan engine.
pub struct Scanner {
    source: Arc<dyn AdvisorySource>,
    config: ScanConfig,
}

impl Scanner {
    /// Creates a scanner backed by the default OSV.dev source.
    pub fn new(config: ScanConfig) -> Self {
        let source = Arc::new(default_source(&config));
        Self { source, config }
    }

    /// Creates a scanner with an explicit advisory source.
    pub fn with_source(source: Arc<dyn AdvisorySource>, config: ScanConfig) -> Self {
        Self { source, config }
    }

    /// Scans the dependency set and returns the aggregated report.
    ///
    /// Fails fast on invalid input, before any query is issued. Per-package
    /// upstream failures degrade that package to "no advisories found" and
    /// never fail the scan.
    ///
    /// # Errors
    ///
    /// [`ScanError::EmptyDependencySet`] for an empty set,
    /// [`ScanError::InvalidInput`] for blank package names, and
    /// [`ScanError::Internal`] if a worker dies unexpectedly.
    pub async fn scan(&self, deps: &DependencySet) -> Result<Report, ScanError> {
        if deps.is_empty() {
            return Err(ScanError::EmptyDependencySet);
        }
        if let Some(dep) = deps.iter().find(|d| d.name.trim().is_empty()) {
            return Err(ScanError::InvalidInput(format!(
                "blank package name (constraint {:?})",
                dep.constraint
            )));
        }

        let gate = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let ecosystem = Arc::new(self.config.ecosystem.clone());

        let handles: Vec<_> = deps
            .iter()
            .enumerate()
            .map(|(index, dep)| {
                let source = Arc::clone(&self.source);
                let gate = Arc::clone(&gate);
                let ecosystem = Arc::clone(&ecosystem);
                let name = dep.name.clone();
                let constraint = dep.constraint.clone();

                tokio::spawn(async move {
                    // Semaphore is never closed while workers run.
                    let _permit = gate.acquire_owned().await.ok();
                    let result = check_package(&*source, &name, &constraint, &ecosystem).await;
                    (index, result)
                })
            })
            .collect();

        let mut slots: Vec<Option<PackageResult>> = Vec::new();
        slots.resize_with(deps.len(), || None);

        for outcome in join_all(handles).await {
            match outcome {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => {
                    error!(error = %e, "scan worker aborted");
                    return Err(ScanError::Internal(e.to_string()));
                }
            }
        }

        Ok(Report::from_results(slots.into_iter().flatten().collect()))
    }
}

/// Runs the per-package pipeline: normalize, query, match, classify.
async fn check_package(
    source: &dyn AdvisorySource,
    name: &str,
    constraint: &str,
    ecosystem: &str,
) -> PackageResult {
    let current = version::normalize(constraint);

    let advisories = match source.query(name, current, ecosystem).await {
        Ok(advisories) => advisories,
        Err(e) => {
            warn!(
                package = name,
                error = %e,
                "advisory query failed after retries, treating as no findings"
            );
            Vec::new()
        }
    };

    let records: Vec<VulnerabilityRecord> = advisories
        .into_iter()
        .filter(|advisory| matcher::is_affected(current, &advisory.affected, ecosystem))
        .map(|advisory| flatten_advisory(name, ecosystem, source.name(), advisory))
        .collect();

    PackageResult::new(name, constraint, records)
}

/// Reshapes a matched advisory into the flat record the report exposes.
fn flatten_advisory(
    package: &str,
    ecosystem: &str,
    source_tag: &str,
    advisory: Advisory,
) -> VulnerabilityRecord {
    let severity = severity::classify(&advisory);

    VulnerabilityRecord {
        severity,
        package: package.to_string(),
        cve: advisory.cve().map(str::to_string),
        vulnerable_versions: matcher::affected_summary(&advisory.affected, ecosystem),
        source: source_tag.to_string(),
        reported: advisory.published,
        reference: advisory.primary_reference().map(str::to_string),
        title: advisory
            .summary
            .clone()
            .unwrap_or_else(|| "Unknown vulnerability".to_string()),
        id: advisory.id,
    }
}
