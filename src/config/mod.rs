use crate::error::{IngestError, Result};
use crate::models::{DateRange, TableId};
use chrono::NaiveDate;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Which variant of the ingestion to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Yesterday through today, one record expected.
    Daily,
    /// Backfill over a fixed range. `None` uses the configured deployment range.
    Bulk { range: Option<DateRange> },
}

/// Where the named values come from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// `config/*.toml`, `.env` and the process environment.
    Process,
    /// An explicit variable map, keyed by environment variable name.
    #[cfg(test)]
    Vars(config::Map<String, String>),
}

/// Validated configuration for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub weather: WeatherConfig,
    pub warehouse: WarehouseConfig,
    pub bulk_range: DateRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherConfig {
    pub api_key: String,
    pub api_url: Url,
    pub city: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseConfig {
    pub project_id: String,
    pub dataset_id: String,
    pub table_name: String,
}

impl WarehouseConfig {
    pub fn table_id(&self) -> TableId {
        TableId {
            project: self.project_id.clone(),
            dataset: self.dataset_id.clone(),
            table: self.table_name.clone(),
        }
    }
}

/// Flat view of the sources, keyed by lower-cased variable name.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    #[serde(alias = "WEATHER_API_KEY")]
    weather_api_key: Option<String>,
    #[serde(alias = "WEATHER_API_URL")]
    weather_api_url: Option<String>,
    #[serde(alias = "GCP_PROJECT_ID")]
    gcp_project_id: Option<String>,
    #[serde(alias = "BIGQUERY_DATASET_ID")]
    bigquery_dataset_id: Option<String>,
    #[serde(alias = "BIGQUERY_TABLE_NAME")]
    bigquery_table_name: Option<String>,
    #[serde(alias = "WEATHER_CITY")]
    weather_city: Option<String>,
    #[serde(alias = "WEATHER_HTTP_TIMEOUT_SECS")]
    weather_http_timeout_secs: Option<String>,
    #[serde(alias = "BULK_START_DATE")]
    bulk_start_date: Option<String>,
    #[serde(alias = "BULK_END_DATE")]
    bulk_end_date: Option<String>,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

const DEFAULT_API_URL: &str = "https://api.weatherbit.io/v2.0/history/daily";
const DEFAULT_CITY: &str = "Chicago";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BULK_START: &str = "2023-06-01";
const DEFAULT_BULK_END: &str = "2023-12-31";

// ── Loader ───────────────────────────────────────────────────────────────────

impl Settings {
    /// Load and validate configuration for `mode`.
    pub fn load(mode: &RunMode, source: ConfigSource) -> Result<Self> {
        let builder = match source {
            ConfigSource::Process => {
                dotenv::dotenv().ok();
                config::Config::builder()
                    .add_source(
                        config::File::with_name("config/default")
                            .required(false)
                            .format(config::FileFormat::Toml),
                    )
                    .add_source(
                        config::File::with_name("config/local")
                            .required(false)
                            .format(config::FileFormat::Toml),
                    )
                    .add_source(config::Environment::default())
            }
            #[cfg(test)]
            ConfigSource::Vars(vars) => config::Config::builder()
                .add_source(config::Environment::default().source(Some(vars))),
        };
        Self::from_builder(mode, builder)
    }

    fn from_builder(mode: &RunMode, builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let raw: RawSettings = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| IngestError::InvalidConfiguration {
                name: "settings",
                reason: e.to_string(),
            })?;
        raw.validate(mode)
    }
}

impl RawSettings {
    fn validate(self, mode: &RunMode) -> Result<Settings> {
        let mut missing = Vec::new();

        let api_key = require(&mut missing, "WEATHER_API_KEY", self.weather_api_key);
        let api_url = match mode {
            RunMode::Bulk { .. } => Some(require(&mut missing, "WEATHER_API_URL", self.weather_api_url)),
            RunMode::Daily => non_empty(self.weather_api_url),
        };
        let project_id = require(&mut missing, "GCP_PROJECT_ID", self.gcp_project_id);
        let dataset_id = require(&mut missing, "BIGQUERY_DATASET_ID", self.bigquery_dataset_id);
        let table_name = require(&mut missing, "BIGQUERY_TABLE_NAME", self.bigquery_table_name);

        if !missing.is_empty() {
            return Err(IngestError::MissingConfiguration(missing));
        }

        let api_url = parse_url(api_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout = match non_empty(self.weather_http_timeout_secs) {
            Some(s) => parse_timeout(&s)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let start = parse_date(
            "BULK_START_DATE",
            non_empty(self.bulk_start_date).as_deref().unwrap_or(DEFAULT_BULK_START),
        )?;
        let end = parse_date(
            "BULK_END_DATE",
            non_empty(self.bulk_end_date).as_deref().unwrap_or(DEFAULT_BULK_END),
        )?;
        if start > end {
            return Err(IngestError::InvalidConfiguration {
                name: "BULK_START_DATE",
                reason: format!("{} is after BULK_END_DATE {}", start, end),
            });
        }

        Ok(Settings {
            weather: WeatherConfig {
                api_key,
                api_url,
                city: non_empty(self.weather_city).unwrap_or_else(|| DEFAULT_CITY.to_string()),
                timeout,
            },
            warehouse: WarehouseConfig {
                project_id,
                dataset_id,
                table_name,
            },
            bulk_range: DateRange { start, end },
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Record `name` as missing instead of returning early, so every absent value is reported.
fn require(missing: &mut Vec<&'static str>, name: &'static str, value: Option<String>) -> String {
    match non_empty(value) {
        Some(v) => v,
        None => {
            missing.push(name);
            String::new()
        }
    }
}

fn parse_url(s: &str) -> Result<Url> {
    let url = Url::parse(s).map_err(|e| IngestError::InvalidConfiguration {
        name: "WEATHER_API_URL",
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(IngestError::InvalidConfiguration {
            name: "WEATHER_API_URL",
            reason: format!("unsupported scheme {:?}", other),
        }),
    }
}

fn parse_timeout(s: &str) -> Result<Duration> {
    match s.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(IngestError::InvalidConfiguration {
            name: "WEATHER_HTTP_TIMEOUT_SECS",
            reason: format!("expected a positive number of seconds, got {:?}", s),
        }),
    }
}

fn parse_date(name: &'static str, s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| IngestError::InvalidConfiguration {
        name,
        reason: format!("{:?}: {}", s, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full() -> config::Map<String, String> {
        vars(&[
            ("WEATHER_API_KEY", "k-123"),
            ("WEATHER_API_URL", "https://weather.example.com/v2/history/daily"),
            ("GCP_PROJECT_ID", "acme"),
            ("BIGQUERY_DATASET_ID", "weather"),
            ("BIGQUERY_TABLE_NAME", "chicago_daily"),
        ])
    }

    fn missing_names(err: IngestError) -> Vec<&'static str> {
        match err {
            IngestError::MissingConfiguration(names) => names,
            other => panic!("expected MissingConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_load_returns_exact_values() {
        let s = Settings::load(&RunMode::Bulk { range: None }, ConfigSource::Vars(full())).unwrap();
        assert_eq!(s.weather.api_key, "k-123");
        assert_eq!(s.weather.api_url.as_str(), "https://weather.example.com/v2/history/daily");
        assert_eq!(s.weather.city, "Chicago");
        assert_eq!(s.weather.timeout, Duration::from_secs(30));
        assert_eq!(s.warehouse.project_id, "acme");
        assert_eq!(s.warehouse.dataset_id, "weather");
        assert_eq!(s.warehouse.table_name, "chicago_daily");
        assert_eq!(s.warehouse.table_id().to_string(), "acme.weather.chicago_daily");
        assert_eq!(s.bulk_range.start_param(), "2023-06-01");
        assert_eq!(s.bulk_range.end_param(), "2023-12-31");
    }

    #[test]
    fn test_each_required_value_is_checked() {
        for name in [
            "WEATHER_API_KEY",
            "WEATHER_API_URL",
            "GCP_PROJECT_ID",
            "BIGQUERY_DATASET_ID",
            "BIGQUERY_TABLE_NAME",
        ] {
            let mut v = full();
            v.remove(name);
            let err = Settings::load(&RunMode::Bulk { range: None }, ConfigSource::Vars(v)).unwrap_err();
            assert_eq!(missing_names(err), vec![name]);
        }
    }

    #[test]
    fn test_all_missing_values_are_reported_together() {
        let v = vars(&[("GCP_PROJECT_ID", "acme"), ("BIGQUERY_TABLE_NAME", "   ")]);
        let err = Settings::load(&RunMode::Bulk { range: None }, ConfigSource::Vars(v)).unwrap_err();
        assert_eq!(
            missing_names(err),
            vec![
                "WEATHER_API_KEY",
                "WEATHER_API_URL",
                "BIGQUERY_DATASET_ID",
                "BIGQUERY_TABLE_NAME",
            ]
        );
    }

    #[test]
    fn test_daily_mode_does_not_require_api_url() {
        let mut v = full();
        v.remove("WEATHER_API_URL");
        let s = Settings::load(&RunMode::Daily, ConfigSource::Vars(v)).unwrap();
        assert_eq!(s.weather.api_url.as_str(), DEFAULT_API_URL);
    }

    #[test]
    fn test_optional_overrides() {
        let mut v = full();
        v.insert("WEATHER_CITY".into(), "Denver".into());
        v.insert("WEATHER_HTTP_TIMEOUT_SECS".into(), "5".into());
        v.insert("BULK_START_DATE".into(), "2022-01-01".into());
        v.insert("BULK_END_DATE".into(), "2022-03-31".into());
        let s = Settings::load(&RunMode::Daily, ConfigSource::Vars(v)).unwrap();
        assert_eq!(s.weather.city, "Denver");
        assert_eq!(s.weather.timeout, Duration::from_secs(5));
        assert_eq!(s.bulk_range.to_string(), "2022-01-01 → 2022-03-31");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut v = full();
        v.insert("WEATHER_API_URL".into(), "not a url".into());
        let err = Settings::load(&RunMode::Daily, ConfigSource::Vars(v)).unwrap_err();
        assert!(matches!(err, IngestError::InvalidConfiguration { name: "WEATHER_API_URL", .. }));

        let mut v = full();
        v.insert("WEATHER_HTTP_TIMEOUT_SECS".into(), "0".into());
        let err = Settings::load(&RunMode::Daily, ConfigSource::Vars(v)).unwrap_err();
        assert!(matches!(err, IngestError::InvalidConfiguration { name: "WEATHER_HTTP_TIMEOUT_SECS", .. }));

        let mut v = full();
        v.insert("BULK_START_DATE".into(), "2024-01-02".into());
        v.insert("BULK_END_DATE".into(), "2024-01-01".into());
        let err = Settings::load(&RunMode::Daily, ConfigSource::Vars(v)).unwrap_err();
        assert!(matches!(err, IngestError::InvalidConfiguration { name: "BULK_START_DATE", .. }));
    }
}
