pub mod http_client;
pub mod mapper;
pub mod parsers;

use crate::config::WeatherConfig;
use crate::error::Result;
use crate::models::{DateRange, ObservationRecord};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use self::http_client::HttpClient;
use self::parsers::parse_observations;

// ── Request ───────────────────────────────────────────────────────────────────

/// Everything one provider call needs.
#[derive(Clone, PartialEq)]
pub struct FetchRequest {
    pub url: Url,
    pub city: String,
    pub api_key: String,
    pub range: DateRange,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn new(config: &WeatherConfig, range: DateRange) -> Self {
        Self {
            url: config.api_url.clone(),
            city: config.city.clone(),
            api_key: config.api_key.clone(),
            range,
            timeout: config.timeout,
        }
    }

    /// Query string pairs: `city`, `key`, `start_date`, `end_date`.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("city", self.city.clone()),
            ("key", self.api_key.clone()),
            ("start_date", self.range.start_param()),
            ("end_date", self.range.end_param()),
        ]
    }
}

// Keep the key out of logs.
impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("url", &self.url.as_str())
            .field("city", &self.city)
            .field("api_key", &"<redacted>")
            .field("range", &self.range)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable weather provider.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<ObservationRecord>>;
}

// ── Weatherbit-style HTTP API ─────────────────────────────────────────────────

/// The HTTP client is built on first fetch, so a build failure surfaces as a
/// failed fetch of that run.
pub struct WeatherbitClient {
    client: OnceCell<HttpClient>,
}

impl WeatherbitClient {
    pub fn new() -> Self {
        Self {
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&HttpClient> {
        self.client.get_or_try_init(|| async { HttpClient::new() }).await
    }
}

impl Default for WeatherbitClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherSource for WeatherbitClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<ObservationRecord>> {
        info!("Fetching {} weather for {}", request.city, request.range);

        let query = request.query();
        let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let body = self
            .client()
            .await?
            .get_text(&request.url, &pairs, request.timeout)
            .await?;

        let records = parse_observations(&body)?;
        debug!("{}: {} records for {}", request.city, records.len(), request.range);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request() -> FetchRequest {
        let config = WeatherConfig {
            api_key: "secret-key".into(),
            api_url: Url::parse("https://weather.example.com/v2/history/daily").unwrap(),
            city: "Chicago".into(),
            timeout: Duration::from_secs(30),
        };
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        };
        FetchRequest::new(&config, range)
    }

    #[test]
    fn test_query_parameters() {
        let q = request().query();
        assert_eq!(
            q,
            vec![
                ("city", "Chicago".to_string()),
                ("key", "secret-key".to_string()),
                ("start_date", "2024-05-09".to_string()),
                ("end_date", "2024-05-10".to_string()),
            ]
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let dbg = format!("{:?}", request());
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_failure() {
        let mut req = request();
        // Port 9 on localhost: nothing listens there in test environments.
        req.url = Url::parse("http://127.0.0.1:9/history/daily").unwrap();
        req.timeout = Duration::from_secs(2);

        let client = WeatherbitClient::new();
        let err = client.fetch(&req).await.unwrap_err();
        assert!(matches!(err, crate::error::IngestError::FetchFailed(_)));
        assert!(!err.to_string().contains("secret-key"));
    }
}
