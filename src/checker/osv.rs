use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AdvisorySource;
use crate::config::ScanConfig;
use crate::model::Advisory;

const OSV_QUERY_URL: &str = "https://api.osv.dev/v1/query";

/// Advisory source backed by the OSV.dev query API.
///
/// Issues one POST per package. Transport failures and 5xx responses are
/// retried with exponential backoff; any other non-success response is
/// treated as "no advisories found" for that package.
pub struct OsvClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl OsvClient {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OSV_QUERY_URL.to_string(),
            timeout: config.timeout,
            max_retries: config.max_retries,
        }
    }

    /// Overrides the query endpoint; used to point at a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    package: QueryPackage<'a>,
    #[serde(skip_serializing_if = "str::is_empty")]
    version: &'a str,
}

#[derive(Serialize)]
struct QueryPackage<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

// An empty result is `{}` (or an explicit null) rather than an empty array.
#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    vulns: Option<Vec<Advisory>>,
}

#[async_trait]
impl AdvisorySource for OsvClient {
    fn name(&self) -> &'static str {
        "OSV.dev"
    }

    async fn query(
        &self,
        package: &str,
        version: &str,
        ecosystem: &str,
    ) -> Result<Vec<Advisory>> {
        let body = QueryRequest {
            package: QueryPackage {
                name: package,
                ecosystem,
            },
            version,
        };

        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..=self.max_retries {
            let response = self
                .client
                .post(&self.base_url)
                .timeout(self.timeout)
                .json(&body)
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => {
                    let parsed: QueryResponse = response.json().await?;
                    let vulns = parsed.vulns.unwrap_or_default();
                    debug!(package, advisories = vulns.len(), "advisory query completed");
                    return Ok(vulns);
                }
                Ok(response) if response.status().is_server_error() && attempt < self.max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    warn!(
                        package,
                        status = %response.status(),
                        attempt = attempt + 1,
                        "advisory source returned server error, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => {
                    // Non-success after retries: degrade to "no advisories"
                    // so one package's backend failure can't stall the scan.
                    warn!(
                        package,
                        status = %response.status(),
                        "advisory source returned non-success status, treating as no findings"
                    );
                    return Ok(Vec::new());
                }
                Err(e) if attempt < self.max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    warn!(
                        package,
                        error = %e,
                        attempt = attempt + 1,
                        "advisory query failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("advisory query retries exhausted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_shape() {
        let body = QueryRequest {
            package: QueryPackage {
                name: "lodash",
                ecosystem: "npm",
            },
            version: "4.17.20",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["package"]["name"], "lodash");
        assert_eq!(json["package"]["ecosystem"], "npm");
        assert_eq!(json["version"], "4.17.20");
    }

    #[test]
    fn test_query_request_omits_empty_version() {
        let body = QueryRequest {
            package: QueryPackage {
                name: "lodash",
                ecosystem: "npm",
            },
            version: "",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("version").is_none());
    }

    #[test]
    fn test_query_response_tolerates_missing_vulns() {
        let parsed: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.vulns.is_none());

        let parsed: QueryResponse = serde_json::from_str(r#"{"vulns": null}"#).unwrap();
        assert!(parsed.vulns.is_none());
    }

    #[test]
    fn test_client_name() {
        let client = OsvClient::new(&ScanConfig::default());
        assert_eq!(client.name(), "OSV.dev");
    }

    mod endpoint {
        use super::*;
        use crate::model::DependencySet;
        use crate::scanner::Scanner;
        use std::sync::Arc;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        /// Minimal HTTP stub: serves the canned (status, body) responses in
        /// order, one connection each, and reports how many requests it saw.
        async fn stub_endpoint(
            responses: Vec<(u16, String)>,
        ) -> (String, tokio::task::JoinHandle<usize>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}/v1/query", listener.local_addr().unwrap());

            let handle = tokio::spawn(async move {
                let mut served = 0;
                for (status, body) in responses {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        break;
                    };
                    let mut buf = vec![0u8; 8192];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    served += 1;
                }
                served
            });

            (url, handle)
        }

        /// Accepts connections but never answers, to trip the query timeout.
        async fn silent_endpoint() -> String {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}/v1/query", listener.local_addr().unwrap());

            tokio::spawn(async move {
                loop {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        break;
                    };
                    let mut buf = vec![0u8; 8192];
                    let _ = socket.read(&mut buf).await;
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    drop(socket);
                }
            });

            url
        }

        fn config(max_retries: u32) -> ScanConfig {
            ScanConfig {
                timeout: Duration::from_millis(500),
                max_retries,
                ..ScanConfig::default()
            }
        }

        #[tokio::test]
        async fn test_server_error_retried_then_degrades_to_empty() {
            let (url, handle) =
                stub_endpoint(vec![(500, String::new()), (500, String::new())]).await;
            let client = OsvClient::new(&config(1)).with_base_url(url);

            let advisories = client.query("lodash", "4.17.20", "npm").await.unwrap();

            assert!(advisories.is_empty());
            // the second request is the retry
            assert_eq!(handle.await.unwrap(), 2);
        }

        #[tokio::test]
        async fn test_server_error_then_success_returns_advisories() {
            let body = r#"{"vulns": [{"id": "GHSA-stub"}]}"#.to_string();
            let (url, handle) = stub_endpoint(vec![(500, String::new()), (200, body)]).await;
            let client = OsvClient::new(&config(1)).with_base_url(url);

            let advisories = client.query("lodash", "4.17.20", "npm").await.unwrap();

            assert_eq!(advisories.len(), 1);
            assert_eq!(advisories[0].id, "GHSA-stub");
            assert_eq!(handle.await.unwrap(), 2);
        }

        #[tokio::test]
        async fn test_client_error_degrades_without_retry() {
            let (url, handle) = stub_endpoint(vec![(404, "not found".to_string())]).await;
            let client = OsvClient::new(&config(2)).with_base_url(url);

            let advisories = client.query("ghost", "1.0.0", "npm").await.unwrap();

            assert!(advisories.is_empty());
            // 4xx must not burn retry attempts
            assert_eq!(handle.await.unwrap(), 1);
        }

        #[tokio::test]
        async fn test_timeout_exhaustion_surfaces_error() {
            let url = silent_endpoint().await;
            let client = OsvClient::new(&ScanConfig {
                timeout: Duration::from_millis(100),
                max_retries: 0,
                ..ScanConfig::default()
            })
            .with_base_url(url);

            assert!(client.query("lodash", "4.17.20", "npm").await.is_err());
        }

        #[tokio::test]
        async fn test_unparseable_payload_surfaces_error() {
            let (url, _handle) = stub_endpoint(vec![(200, "this is not json".to_string())]).await;
            let client = OsvClient::new(&config(0)).with_base_url(url);

            assert!(client.query("lodash", "4.17.20", "npm").await.is_err());
        }

        #[tokio::test]
        async fn test_unparseable_payload_degrades_package_not_scan() {
            // A malformed payload for one package is contained at the worker
            // boundary like any other upstream failure: the package degrades
            // to "no advisories found" and the scan still succeeds.
            let (url, _handle) = stub_endpoint(vec![(200, "this is not json".to_string())]).await;
            let client = OsvClient::new(&config(0)).with_base_url(url);
            let scanner = Scanner::with_source(Arc::new(client), ScanConfig::default());

            let deps =
                DependencySet::from_pairs([("lodash".to_string(), "^4.17.0".to_string())]);
            let report = scanner.scan(&deps).await.unwrap();

            assert_eq!(report.summary.total, 1);
            assert_eq!(report.summary.vulnerable, 0);
        }
    }
}
