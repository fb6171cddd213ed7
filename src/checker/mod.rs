mod osv;

pub use osv::OsvClient;

use crate::config::ScanConfig;
use crate::model::Advisory;
use anyhow::Result;
use async_trait::async_trait;

/// A queryable vulnerability-advisory source.
///
/// One logical query per package per scan; implementations own their
/// timeout and retry behavior. The engine mocks this seam in tests.
#[async_trait]
pub trait AdvisorySource: Send + Sync {
    /// Human-readable source tag, surfaced in report records.
    fn name(&self) -> &'static str;

    /// Fetches the raw advisories for one package, before range filtering.
    async fn query(&self, package: &str, version: &str, ecosystem: &str)
        -> Result<Vec<Advisory>>;
}

pub fn default_source(config: &ScanConfig) -> OsvClient {
    OsvClient::new(config)
}
