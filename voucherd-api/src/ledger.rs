//! HTTP client for the remote spreadsheet ledger.
//!
//! The ledger exposes a single endpoint: GET returns the full
//! dashboard snapshot as JSON, POST appends or deletes a voucher row.
//! Both directions go through [`voucherd_core::normalize`] so the
//! rest of the service never sees the ledger's loose field spellings.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::{json, Value};
use voucherd_cache::SnapshotFetcher;
use voucherd_core::{normalize, LedgerError, Snapshot, VoucherRecord};

/// Outer bound on one round-trip to the ledger. The cache applies its
/// own (tighter) fetch timeout on top of this.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Write-side seam. Handlers depend on this trait rather than on
/// [`LedgerClient`] so tests can substitute an in-memory ledger.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Append one voucher row. Returns the ledger's acknowledgement body.
    async fn append_record(&self, record: &VoucherRecord) -> Result<Value, LedgerError>;

    /// Delete the row with the given voucher number.
    async fn delete_record(&self, voucher_no: &str) -> Result<Value, LedgerError>;
}

/// Thin reqwest wrapper around the ledger endpoint.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    client: reqwest::Client,
    base_url: String,
}

impl LedgerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// GET the full snapshot. A cache-busting timestamp keeps
    /// intermediaries from replaying an old body.
    async fn fetch_raw(&self) -> Result<Value, LedgerError> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let url = format!("{}?t={}", self.base_url, ts);

        let response = self.client.get(&url).send().await.map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::upstream(format!(
                "ledger returned HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LedgerError::malformed(format!("snapshot body is not JSON: {e}")))
    }

    async fn post_command(&self, body: Value) -> Result<Value, LedgerError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::upstream(format!(
                "ledger write returned HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LedgerError::malformed(format!("write acknowledgement is not JSON: {e}")))
    }
}

fn map_transport(err: reqwest::Error) -> LedgerError {
    if err.is_timeout() {
        LedgerError::Timeout {
            limit: HTTP_TIMEOUT,
        }
    } else {
        LedgerError::upstream(format!("ledger request failed: {err}"))
    }
}

#[async_trait]
impl SnapshotFetcher for LedgerClient {
    async fn fetch_snapshot(&self) -> Result<Snapshot, LedgerError> {
        let raw = self.fetch_raw().await?;
        Ok(normalize::snapshot(&raw))
    }
}

#[async_trait]
impl LedgerWriter for LedgerClient {
    async fn append_record(&self, record: &VoucherRecord) -> Result<Value, LedgerError> {
        let data = serde_json::to_value(record)
            .map_err(|e| LedgerError::malformed(format!("unserializable record: {e}")))?;
        self.post_command(json!({ "action": "send", "data": data }))
            .await
    }

    async fn delete_record(&self, voucher_no: &str) -> Result<Value, LedgerError> {
        self.post_command(json!({ "action": "delete", "voucherno": voucher_no }))
            .await
    }
}
