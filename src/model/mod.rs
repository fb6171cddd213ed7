//! Core data types for advisories, dependencies, and scan reports.
//!
//! This module contains the fundamental types used throughout depscan:
//!
//! - [`Advisory`] - A vulnerability record from the advisory source
//! - [`DependencySet`] - The caller-supplied name → constraint mapping
//! - [`PackageResult`] - The per-package scan outcome
//! - [`Report`] - Complete scan report with summary counters
//! - [`Severity`] - Severity tier, ranked critical > high > moderate > low > info
//!
//! # Example
//!
//! ```
//! use depscan::model::{DependencySet, PackageResult, Report};
//!
//! let deps = DependencySet::from_pairs([
//!     ("lodash".to_string(), "^4.17.0".to_string()),
//! ]);
//! let report = Report::from_results(vec![PackageResult::new("lodash", "^4.17.0", vec![])]);
//!
//! assert_eq!(report.summary.total, deps.len());
//! ```

mod advisory;
mod report;

pub use advisory::*;
pub use report::*;
