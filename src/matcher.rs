//! Advisory range matching.
//!
//! Decides whether a normalized version falls inside an advisory's affected
//! set, restricted to descriptors for the target ecosystem. Only SEMVER and
//! ECOSYSTEM ranges are honored; GIT and unrecognized range types are
//! skipped. An advisory with no descriptors matches nothing (fail closed).

use std::cmp::Ordering;

use crate::model::{Affected, Event, RangeType};
use crate::version::compare;

/// Returns true if `version` is inside any of the advisory's affected
/// descriptors for `ecosystem`.
///
/// Evaluated per descriptor in order, short-circuiting on the first match:
/// an exact hit in the explicit version list, or a satisfied range. Range
/// events are evaluated as:
///
/// - `introduced` + `fixed`: `introduced <= version < fixed`
/// - `introduced` only: `version >= introduced` (open-ended)
/// - `last_affected`: `version <= last_affected`
pub fn is_affected(version: &str, affected: &[Affected], ecosystem: &str) -> bool {
    for descriptor in affected {
        let Some(package) = &descriptor.package else {
            continue;
        };
        if !package.ecosystem.eq_ignore_ascii_case(ecosystem) {
            continue;
        }

        if descriptor.versions.iter().any(|v| v == version) {
            return true;
        }

        for range in &descriptor.ranges {
            if !matches!(range.range_type, RangeType::Semver | RangeType::Ecosystem) {
                continue;
            }
            if events_match(version, &range.events) {
                return true;
            }
        }
    }

    false
}

/// Evaluates one range's event list against `version`.
fn events_match(version: &str, events: &[Event]) -> bool {
    let mut introduced: Option<&str> = None;
    let mut fixed: Option<&str> = None;
    let mut last_affected: Option<&str> = None;

    for event in events {
        match event {
            Event::Introduced(v) => introduced.get_or_insert(v.as_str()),
            Event::Fixed(v) => fixed.get_or_insert(v.as_str()),
            Event::LastAffected(v) => last_affected.get_or_insert(v.as_str()),
            // `limit` bounds database enumeration, not affectedness
            Event::Limit(_) => continue,
        };
    }

    match (introduced, fixed) {
        (Some(start), Some(end)) => {
            if compare(version, start) != Ordering::Less && compare(version, end) == Ordering::Less
            {
                return true;
            }
        }
        (Some(start), None) => {
            if compare(version, start) != Ordering::Less {
                return true;
            }
        }
        _ => {}
    }

    if let Some(last) = last_affected {
        if compare(version, last) != Ordering::Greater {
            return true;
        }
    }

    false
}

/// Builds a human-readable description of the affected version set for the
/// report, from the same descriptors the matcher evaluates.
///
/// Example outputs: `">=1.0.0, <2.0.0"`, `">=3.0.0"`, `"<=1.2.0"`,
/// `"1.0.0, 1.0.1"`. Falls back to `"unspecified"` when the advisory gives
/// nothing usable for the ecosystem.
pub fn affected_summary(affected: &[Affected], ecosystem: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for descriptor in affected {
        let Some(package) = &descriptor.package else {
            continue;
        };
        if !package.ecosystem.eq_ignore_ascii_case(ecosystem) {
            continue;
        }

        if !descriptor.versions.is_empty() {
            parts.push(descriptor.versions.join(", "));
        }

        for range in &descriptor.ranges {
            if !matches!(range.range_type, RangeType::Semver | RangeType::Ecosystem) {
                continue;
            }
            if let Some(description) = describe_events(&range.events) {
                parts.push(description);
            }
        }
    }

    if parts.is_empty() {
        "unspecified".to_string()
    } else {
        parts.join("; ")
    }
}

fn describe_events(events: &[Event]) -> Option<String> {
    let mut introduced: Option<&str> = None;
    let mut fixed: Option<&str> = None;
    let mut last_affected: Option<&str> = None;

    for event in events {
        match event {
            Event::Introduced(v) => introduced.get_or_insert(v.as_str()),
            Event::Fixed(v) => fixed.get_or_insert(v.as_str()),
            Event::LastAffected(v) => last_affected.get_or_insert(v.as_str()),
            Event::Limit(_) => continue,
        };
    }

    match (introduced, fixed, last_affected) {
        (Some(start), Some(end), _) => Some(format!(">={}, <{}", start, end)),
        (Some(start), None, Some(last)) => Some(format!(">={}, <={}", start, last)),
        (Some(start), None, None) => Some(format!(">={}", start)),
        (None, Some(end), _) => Some(format!("<{}", end)),
        (None, None, Some(last)) => Some(format!("<={}", last)),
        (None, None, None) => None,
    }
}
