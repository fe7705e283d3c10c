use crate::error::{Result, RuntimeError};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use vigil_core::{HttpResponseSnapshot, ProbeError};

/// Configuration for the probe HTTP client
#[derive(Debug, Clone)]
pub struct HttpProbeClientConfig {
    /// Base URL that request paths are joined onto
    pub base_url: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpProbeClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("vigil/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client handed to probes, producing response snapshots
///
/// Cloning is cheap and clones share one connection pool, so a single client
/// can serve every probe concurrently.
#[derive(Debug, Clone)]
pub struct HttpProbeClient {
    base_url: String,
    client: Client,
}

impl HttpProbeClient {
    pub fn new(config: &HttpProbeClientConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(RuntimeError::invalid_config(
                "base URL is empty",
                "Pass the address of the application under test, e.g. https://www.bing.com",
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RuntimeError::http_client(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET {base_url}/{path}
    pub async fn get(&self, path: &str) -> std::result::Result<HttpResponseSnapshot, ProbeError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let resp = self.client.get(&url).send().await?;
        HttpResponseSnapshot::from_reqwest(resp).await
    }

    /// POST {base_url}/{path} with a JSON body
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> std::result::Result<HttpResponseSnapshot, ProbeError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let resp = self.client.post(&url).json(body).send().await?;
        HttpResponseSnapshot::from_reqwest(resp).await
    }
}
