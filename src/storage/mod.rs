use crate::error::{IngestError, Result};
use crate::models::{RowInsertError, TableId, WarehouseRow};
use async_trait::async_trait;
use google_cloud_bigquery::client::{Client, ClientConfig};
use google_cloud_bigquery::http::tabledata::insert_all::{InsertAllRequest, InsertAllResponse, Row};
use tokio::sync::OnceCell;
use tracing::{debug, info};

// ── Sink trait ────────────────────────────────────────────────────────────────

/// Destination for mapped rows.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Append `rows` to `table` in a single streaming call.
    ///
    /// `Ok` carries the per-row rejections (empty on full success).
    /// `Err` means the call itself failed.
    async fn insert(&self, table: &TableId, rows: &[WarehouseRow]) -> Result<Vec<RowInsertError>>;
}

// ── BigQuery ──────────────────────────────────────────────────────────────────

/// Streaming inserts through `tabledata.insertAll`.
///
/// The client (and the credential lookup behind it) is built on first use.
pub struct BigQueryWarehouse {
    client: OnceCell<Client>,
}

impl BigQueryWarehouse {
    pub fn new() -> Self {
        Self {
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let (config, project) = ClientConfig::new_with_auth()
                    .await
                    .map_err(|e| IngestError::InsertFailed(format!("BigQuery auth failed: {}", e)))?;
                debug!("BigQuery credentials loaded (default project: {:?})", project);

                Client::new(config)
                    .await
                    .map_err(|e| IngestError::InsertFailed(format!("BigQuery client failed: {}", e)))
            })
            .await
    }
}

impl Default for BigQueryWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    async fn insert(&self, table: &TableId, rows: &[WarehouseRow]) -> Result<Vec<RowInsertError>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.client().await?;

        let request = InsertAllRequest {
            rows: rows
                .iter()
                .cloned()
                .map(|json| Row {
                    insert_id: None,
                    json,
                })
                .collect(),
            ..Default::default()
        };

        info!("Inserting {} rows into {}", rows.len(), table);
        let resp = client
            .tabledata()
            .insert(&table.project, &table.dataset, &table.table, &request)
            .await
            .map_err(|e| IngestError::InsertFailed(e.to_string()))?;

        Ok(row_errors(resp))
    }
}

/// Per-row rejections from an `insertAll` response, in the order BigQuery reported them.
fn row_errors(resp: InsertAllResponse) -> Vec<RowInsertError> {
    resp.insert_errors
        .unwrap_or_default()
        .into_iter()
        .map(|e| RowInsertError {
            index: usize::try_from(e.index).ok(),
            messages: e
                .errors
                .into_iter()
                .map(|m| format!("{}: {}", m.reason, m.message))
                .collect(),
        })
        .collect()
}
