use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ── Provider record ───────────────────────────────────────────────────────────

/// One day of observations as the provider sends it.
/// Every field may be missing; unknown fields are ignored. Values are kept
/// as raw JSON so whatever the provider sent reaches the warehouse as-is.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ObservationRecord {
    #[serde(default)]
    pub datetime: Option<Value>,
    #[serde(default)]
    pub clouds: Option<Value>,
    #[serde(default)]
    pub temp: Option<Value>,
    #[serde(default)]
    pub max_temp: Option<Value>,
    #[serde(default)]
    pub min_temp: Option<Value>,
    #[serde(default)]
    pub precip: Option<Value>,
    #[serde(default)]
    pub snow: Option<Value>,
    #[serde(default)]
    pub snow_depth: Option<Value>,
    #[serde(default)]
    pub wind_spd: Option<Value>,
}

/// Top-level provider body: `{"data": [...]}`.
#[derive(Debug, Deserialize)]
pub struct ObservationResponse {
    pub data: Option<Vec<ObservationRecord>>,
}

// ── Warehouse row ─────────────────────────────────────────────────────────────

/// Destination table schema. `None` serializes as JSON `null`; the warehouse
/// checks column types per row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WarehouseRow {
    pub date: Option<Value>,
    pub clouds: Option<Value>,
    pub temperature: Option<Value>,
    pub max_temp: Option<Value>,
    pub min_temp: Option<Value>,
    pub precipitation: Option<Value>,
    pub snow: Option<Value>,
    pub snow_depth: Option<Value>,
    pub wind_speed: Option<Value>,
}

/// A rejected row reported back by the warehouse.
/// `index` is `None` when the warehouse reported an index outside the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RowInsertError {
    pub index: Option<usize>,
    pub messages: Vec<String>,
}

impl fmt::Display for RowInsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "row {}: {}", i, self.messages.join("; ")),
            None => write!(f, "row ?: {}", self.messages.join("; ")),
        }
    }
}

// ── Date range ────────────────────────────────────────────────────────────────

/// Inclusive calendar range sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start_param(), self.end_param())
    }
}

// ── Table id ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableId {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_id_is_fully_qualified() {
        let id = TableId {
            project: "acme".into(),
            dataset: "weather".into(),
            table: "chicago_daily".into(),
        };
        assert_eq!(id.to_string(), "acme.weather.chicago_daily");
    }

    #[test]
    fn test_record_ignores_unknown_fields_and_nulls() {
        let rec: ObservationRecord = serde_json::from_str(
            r#"{"datetime":"2023-06-01","temp":21.5,"snow":null,"rh":60,"ts":1685577600}"#,
        )
        .unwrap();
        assert_eq!(rec.datetime, Some(json!("2023-06-01")));
        assert_eq!(rec.temp, Some(json!(21.5)));
        assert_eq!(rec.snow, None);
        assert_eq!(rec.clouds, None);
    }

    #[test]
    fn test_date_range_params() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        };
        assert_eq!(range.start_param(), "2023-06-01");
        assert_eq!(range.end_param(), "2023-12-31");
    }
}
