//! Severity classification for matched advisories.
//!
//! Advisory metadata is heterogeneous: some records carry a database-native
//! severity string, some only a CVSS score, some nothing but prose. The
//! classifier evaluates those sources in strict priority order and always
//! produces a tier, so downstream aggregation never deals with "unknown".

use crate::model::{Advisory, Severity};

/// Derives a severity tier from an advisory, best effort.
///
/// Priority order, first decisive source wins:
///
/// 1. database-native severity string (case-insensitive substring match);
/// 2. CVSS v3 score thresholds: >=9 critical, >=7 high, >=4 moderate, >0 low;
/// 3. keywords in the advisory summary;
/// 4. [`Severity::Info`].
pub fn classify(advisory: &Advisory) -> Severity {
    if let Some(severity) = database_severity(advisory) {
        return severity;
    }

    if let Some(severity) = cvss_severity(advisory) {
        return severity;
    }

    if let Some(severity) = keyword_severity(advisory) {
        return severity;
    }

    Severity::Info
}

fn database_severity(advisory: &Advisory) -> Option<Severity> {
    let raw = advisory.database_specific.as_ref()?.severity.as_ref()?;
    let raw = raw.to_lowercase();

    if raw.contains("critical") {
        Some(Severity::Critical)
    } else if raw.contains("high") {
        Some(Severity::High)
    } else if raw.contains("medium") || raw.contains("moderate") {
        Some(Severity::Moderate)
    } else if raw.contains("low") {
        Some(Severity::Low)
    } else {
        None
    }
}

fn cvss_severity(advisory: &Advisory) -> Option<Severity> {
    let entry = advisory
        .severity
        .iter()
        .find(|e| e.score_type.starts_with("CVSS_V3"))?;
    let score: f32 = entry.score.trim().parse().ok()?;

    match score {
        s if s >= 9.0 => Some(Severity::Critical),
        s if s >= 7.0 => Some(Severity::High),
        s if s >= 4.0 => Some(Severity::Moderate),
        s if s > 0.0 => Some(Severity::Low),
        _ => None,
    }
}

fn keyword_severity(advisory: &Advisory) -> Option<Severity> {
    let summary = advisory.summary.as_deref().unwrap_or("").to_lowercase();

    const CRITICAL: [&str; 3] = ["critical", "rce", "code execution"];
    const HIGH: [&str; 3] = ["high", "privilege", "bypass"];
    const MODERATE: [&str; 3] = ["medium", "moderate", "disclosure"];

    if CRITICAL.iter().any(|k| summary.contains(k)) {
        Some(Severity::Critical)
    } else if HIGH.iter().any(|k| summary.contains(k)) {
        Some(Severity::High)
    } else if MODERATE.iter().any(|k| summary.contains(k)) {
        Some(Severity::Moderate)
    } else {
        None
    }
}
