//! Version constraint normalization and lenient version comparison.
//!
//! Declared constraints like `^1.2.3` or `>=2.0.0` are normalized to a bare
//! dotted-numeric string before being compared against advisory ranges.
//!
//! The comparator here is deliberately *not* a semver comparator: components
//! are parsed as plain integers, missing components count as zero, and
//! anything unparsable (including pre-release suffixes like `"3-beta"`) also
//! counts as zero. Advisory range matching depends on these exact semantics.

use std::cmp::Ordering;

/// Characters that may prefix a declared version constraint.
const CONSTRAINT_OPERATORS: [char; 6] = ['~', '^', '>', '=', '<', '*'];

/// Strips any leading run of constraint-operator characters (`~ ^ > = < *`)
/// from a declared version string.
///
/// No validation is performed; the result may be empty or non-numeric.
/// Idempotent: normalizing an already-normalized string is a no-op.
///
/// # Example
///
/// ```
/// use depscan::version::normalize;
///
/// assert_eq!(normalize("^1.2.3"), "1.2.3");
/// assert_eq!(normalize(">=2.0.0"), "2.0.0");
/// assert_eq!(normalize("2.0.0"), "2.0.0");
/// ```
pub fn normalize(constraint: &str) -> &str {
    constraint.trim_start_matches(|c: char| CONSTRAINT_OPERATORS.contains(&c))
}

/// Compares two normalized version strings component-wise.
///
/// Each string is split on `.`; components parse as integers with absent or
/// unparsable components treated as zero, and the shorter sequence implicitly
/// zero-padded. The first differing component decides.
///
/// # Example
///
/// ```
/// use depscan::version::compare;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare("1.2", "1.2.0"), Ordering::Equal);
/// assert_eq!(compare("1.10.0", "1.9.0"), Ordering::Greater);
/// ```
pub fn compare(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();
    let len = left.len().max(right.len());

    for i in 0..len {
        let x = component(&left, i);
        let y = component(&right, i);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}

fn component(parts: &[&str], index: usize) -> u64 {
    parts
        .get(index)
        .and_then(|p| p.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_operators() {
        assert_eq!(normalize("^1.2.3"), "1.2.3");
        assert_eq!(normalize("~1.2.3"), "1.2.3");
        assert_eq!(normalize(">=2.0.0"), "2.0.0");
        assert_eq!(normalize("<3.0.0"), "3.0.0");
        assert_eq!(normalize("*"), "");
    }

    #[test]
    fn test_normalize_passthrough() {
        assert_eq!(normalize("2.0.0"), "2.0.0");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize("^~>=1.0.0");
        assert_eq!(once, "1.0.0");
        assert_eq!(normalize(once), once);
    }

    #[test]
    fn test_compare_equal_with_implicit_zeros() {
        assert_eq!(compare("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare("1", "1.0.0"), Ordering::Equal);
        assert_eq!(compare("", "0.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_compare_numeric_not_lexicographic() {
        assert_eq!(compare("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare("0.9.0", "0.10.0"), Ordering::Less);
    }

    #[test]
    fn test_compare_antisymmetric() {
        let cases = [("1.2.3", "1.2.4"), ("2.0", "1.9.9"), ("1.0.0", "1.0.0")];
        for (a, b) in cases {
            assert_eq!(compare(a, b), compare(b, a).reverse());
        }
    }

    #[test]
    fn test_compare_lenient_non_numeric_components() {
        // Pre-release suffixes are not understood; "3-beta" parses as 0.
        // Known limitation, preserved because range matching relies on it.
        assert_eq!(compare("1.2.3-beta", "1.2.0"), Ordering::Equal);
        assert_eq!(compare("1.2.3-beta", "1.2"), Ordering::Equal);
        assert_eq!(compare("1.2.3-beta", "1.2.1"), Ordering::Less);
        assert_eq!(compare("abc", "0"), Ordering::Equal);
    }
}
