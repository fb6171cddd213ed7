//! Scan-level error taxonomy.
//!
//! Only whole-scan failures surface here. Per-package upstream failures are
//! contained inside the engine: they degrade that one package to an empty
//! advisory list and are logged, never raised to the caller.

use thiserror::Error;

/// Errors a scan can return to the caller.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The dependency set was empty; nothing was queried.
    #[error("dependency set is empty")]
    EmptyDependencySet,

    /// The dependency mapping was malformed (e.g., a blank package name).
    #[error("invalid dependency input: {0}")]
    InvalidInput(String),

    /// An unexpected internal fault; details are logged, not exposed.
    #[error("internal scan failure")]
    Internal(String),
}

impl ScanError {
    /// True for errors caused by the caller's input, as opposed to faults
    /// inside the engine. The CLI maps this to its exit-code split.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScanError::EmptyDependencySet | ScanError::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_split() {
        assert!(ScanError::EmptyDependencySet.is_client_error());
        assert!(ScanError::InvalidInput("bad".into()).is_client_error());
        assert!(!ScanError::Internal("boom".into()).is_client_error());
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = ScanError::Internal("worker panicked at src/x.rs:42".into());
        assert_eq!(err.to_string(), "internal scan failure");
    }
}
