use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vulnerability advisory as returned by the advisory source.
///
/// Field shapes follow the OSV schema; every field except `id` is optional
/// in practice, so everything carries a serde default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    /// Unique identifier (e.g., "GHSA-xxxx-xxxx-xxxx", "CVE-2024-1234").
    pub id: String,
    /// Brief summary of the vulnerability.
    #[serde(default)]
    pub summary: Option<String>,
    /// Detailed description of the vulnerability.
    #[serde(default)]
    pub details: Option<String>,
    /// Alternative identifiers (a CVE alias, if present, is surfaced in the report).
    #[serde(default)]
    pub aliases: Vec<String>,
    /// When the advisory was first published.
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    /// When the advisory was last modified.
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    /// Affected packages and version ranges.
    #[serde(default)]
    pub affected: Vec<Affected>,
    /// References to external resources (advisories, patches, etc.).
    #[serde(default)]
    pub references: Vec<Reference>,
    /// Severity scoring entries (e.g., CVSS v3 vectors or scores).
    #[serde(default)]
    pub severity: Vec<SeverityEntry>,
    /// Source-database metadata; carries the database-native severity string.
    #[serde(default)]
    pub database_specific: Option<DatabaseSpecific>,
}

impl Advisory {
    /// Returns the first CVE alias, if the advisory has one.
    pub fn cve(&self) -> Option<&str> {
        self.aliases
            .iter()
            .find(|a| a.starts_with("CVE-"))
            .map(String::as_str)
    }

    /// Returns the first reference URL, if any.
    pub fn primary_reference(&self) -> Option<&str> {
        self.references
            .iter()
            .filter_map(|r| r.url.as_deref())
            .next()
    }
}

/// Source-database metadata attached to an advisory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSpecific {
    /// Database-native severity string (e.g., "HIGH", "MODERATE").
    #[serde(default)]
    pub severity: Option<String>,
}

/// Ties an advisory to one package in one ecosystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affected {
    /// Package information; some records omit it entirely.
    #[serde(default)]
    pub package: Option<AffectedPackage>,
    /// Version ranges affected.
    #[serde(default)]
    pub ranges: Vec<Range>,
    /// Explicit list of affected versions.
    #[serde(default)]
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedPackage {
    pub name: String,
    pub ecosystem: String,
}

/// An affected version range, typed per the OSV schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Range {
    #[serde(rename = "type")]
    pub range_type: RangeType,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Range types; unknown/future types deserialize to [`RangeType::Unknown`]
/// and are ignored during matching rather than mis-matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RangeType {
    Semver,
    Ecosystem,
    Git,
    #[serde(other)]
    Unknown,
}

/// A single range event. OSV encodes these as one-key objects like
/// `{"introduced": "1.0.0"}`, which maps onto an externally tagged enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Introduced(String),
    Fixed(String),
    LastAffected(String),
    Limit(String),
}

/// A (scoring-system, score) pair, e.g. `("CVSS_V3", "9.8")`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityEntry {
    #[serde(rename = "type", default)]
    pub score_type: String,
    #[serde(default)]
    pub score: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type", default)]
    pub reference_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}
