use crate::error::{IngestError, Result};
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("weather-ingest/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over `reqwest::Client`: one attempt per call, no retries.
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| IngestError::FetchFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { inner })
    }

    /// GET `url` with `query` appended and return the body.
    /// Non-2xx statuses are errors.
    pub async fn get_text(
        &self,
        url: &Url,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<String> {
        debug!("GET {} (timeout {:?})", url, timeout);

        let resp = self
            .inner
            .get(url.clone())
            .query(query)
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::FetchFailed(format!("HTTP {} from {}", status, url)));
        }

        Ok(resp.text().await?)
    }
}
