use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity tier of a vulnerability.
///
/// Variants are ordered by rank so that `Ord` gives
/// critical > high > moderate > low > info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Moderate => "moderate",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "moderate" | "medium" => Ok(Severity::Moderate),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            _ => Err(format!(
                "Unknown severity: {}. Use 'critical', 'high', 'moderate', 'low', or 'info'",
                s
            )),
        }
    }
}

/// One declared dependency: a package name and its raw constraint string
/// exactly as it appears in the manifest (e.g., `"^1.2.3"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub constraint: String,
}

impl Dependency {
    pub fn new(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
        }
    }
}

/// The set of dependencies for one scan.
///
/// Preserves the caller's insertion order (which fixes the report order) and
/// deduplicates package names, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    entries: Vec<Dependency>,
}

impl DependencySet {
    /// Builds a set from `(name, constraint)` pairs.
    ///
    /// # Example
    ///
    /// ```
    /// use depscan::model::DependencySet;
    ///
    /// let deps = DependencySet::from_pairs([
    ///     ("lodash".to_string(), "^4.17.0".to_string()),
    ///     ("express".to_string(), "~4.18.2".to_string()),
    /// ]);
    /// assert_eq!(deps.len(), 2);
    /// ```
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut entries: Vec<Dependency> = Vec::new();
        for (name, constraint) in pairs {
            if entries.iter().any(|d| d.name == name) {
                continue;
            }
            entries.push(Dependency { name, constraint });
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.entries.iter()
    }
}

impl FromIterator<(String, String)> for DependencySet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

/// One matched advisory, flattened into the shape the report exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    /// Advisory identifier.
    pub id: String,
    /// Name of the affected package.
    pub package: String,
    /// Human summary of the advisory.
    pub title: String,
    /// CVE alias, when the advisory carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,
    /// Human-readable description of the affected version set.
    pub vulnerable_versions: String,
    /// Advisory source tag (e.g., "OSV.dev").
    pub source: String,
    /// When the advisory was published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported: Option<DateTime<Utc>>,
    /// Classified severity tier.
    pub severity: Severity,
    /// One reference URL for further reading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// The per-package outcome of the scan pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageResult {
    /// Package name.
    pub name: String,
    /// Declared version constraint, as supplied by the caller.
    pub version: String,
    /// Advisories that actually apply to the declared version.
    pub advisories: Vec<VulnerabilityRecord>,
    /// True iff `advisories` is non-empty.
    pub is_vulnerable: bool,
    /// Highest severity tier among the matches; only set when vulnerable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_severity: Option<Severity>,
}

impl PackageResult {
    /// Builds a result, deriving the vulnerability flag and highest severity
    /// from the advisory list.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        advisories: Vec<VulnerabilityRecord>,
    ) -> Self {
        let highest_severity = advisories.iter().map(|a| a.severity).max();
        Self {
            name: name.into(),
            version: version.into(),
            is_vulnerable: !advisories.is_empty(),
            highest_severity,
            advisories,
        }
    }
}

/// Aggregate counters over one scan.
///
/// Per-tier counters bucket each vulnerable package once, by its highest
/// severity tier; they do not count individual advisories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Total packages scanned, vulnerable or not.
    pub total: usize,
    /// Packages with at least one matching advisory.
    pub vulnerable: usize,
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
    pub info: usize,
}

/// The complete scan report: summary counters plus the vulnerable packages,
/// in the caller's original dependency order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub summary: Summary,
    pub vulnerabilities: Vec<PackageResult>,
    pub scanned_at: DateTime<Utc>,
}

impl Report {
    /// Reduces the ordered per-package results into the final report.
    ///
    /// Pure and synchronous: counts every input package, buckets vulnerable
    /// packages by highest severity, and drops clean packages from the output
    /// list without reordering the rest.
    pub fn from_results(results: Vec<PackageResult>) -> Self {
        let mut summary = Summary {
            total: results.len(),
            ..Summary::default()
        };

        let vulnerabilities: Vec<PackageResult> = results
            .into_iter()
            .filter(|r| r.is_vulnerable)
            .collect();

        summary.vulnerable = vulnerabilities.len();
        for result in &vulnerabilities {
            match result.highest_severity {
                Some(Severity::Critical) => summary.critical += 1,
                Some(Severity::High) => summary.high += 1,
                Some(Severity::Moderate) => summary.moderate += 1,
                Some(Severity::Low) => summary.low += 1,
                Some(Severity::Info) => summary.info += 1,
                // new() never leaves this unset for a vulnerable package
                None => summary.info += 1,
            }
        }

        Self {
            summary,
            vulnerabilities,
            scanned_at: Utc::now(),
        }
    }
}
