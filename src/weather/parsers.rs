use crate::error::{IngestError, Result};
use crate::models::{ObservationRecord, ObservationResponse};

/// Extract the per-day records from a provider body.
///
/// An empty body means the provider had nothing for the range (it answers
/// `204 No Content` in that case) and yields an empty list.
pub fn parse_observations(body: &str) -> Result<Vec<ObservationRecord>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| IngestError::FetchFailed(format!("response is not valid JSON: {}", e)))?;

    let resp: ObservationResponse = serde_json::from_value(value).map_err(|e| {
        IngestError::FetchFailed(format!("response has an unexpected shape: {}", e))
    })?;

    resp.data.ok_or_else(|| {
        IngestError::FetchFailed("response has no top-level `data` array".to_string())
    })
}
