//! Ledger routes: cached snapshot reads, voucher writes, batch submit.
//!
//! Reads are served from the stale-while-revalidate cache and carry
//! an `X-Cache` header (`HIT`, `STALE`, or `MISS`). Writes go straight
//! to the ledger and invalidate the cache whether or not the ledger
//! accepted them, since a failed write may still have mutated the
//! sheet.

use axum::{
    extract::State,
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use voucherd_core::{normalize, ValidationError, VoucherRecord};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Write commands accepted by POST /cache. The legacy client spells
/// append as `send` and carries the row under `data`; both spellings
/// stay accepted.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum CacheCommand {
    #[serde(alias = "send")]
    Append {
        #[serde(alias = "data")]
        record: Value,
    },
    Delete {
        #[serde(alias = "voucherno")]
        id: String,
    },
}

#[derive(Debug, Deserialize)]
struct BatchSubmitRequest {
    records: Vec<Value>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /cache - Serve the dashboard snapshot.
///
/// Only a cold cache can fail here; once warmed, stale data is served
/// while a background refresh runs. Failures return 503 with the
/// legacy empty-snapshot body so clients can render an empty table.
pub async fn read_cache(State(state): State<AppState>) -> Response {
    match state.cache.read().await {
        Ok(read) => {
            let mut response = Json(read.payload.as_ref()).into_response();
            response.headers_mut().insert(
                X_CACHE,
                HeaderValue::from_static(read.status.as_header_value()),
            );
            response
        }
        Err(e) => {
            warn!(error = %e, "snapshot fetch failed with cold cache");
            let kind = if e.is_timeout() { "timeout" } else { "fetch_failed" };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": kind, "records": [] })),
            )
                .into_response()
        }
    }
}

/// POST /cache - Append or delete one voucher row.
pub async fn write_cache(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let command: CacheCommand = serde_json::from_value(body)?;

    match command {
        CacheCommand::Append { record } => {
            let record = normalize::record(&record);
            validate_record(&record)?;

            let result = state.ledger.append_record(&record).await;
            // Invalidate even on failure; a rejected write may still
            // have touched the sheet.
            state.cache.invalidate().await;
            let ack = result?;

            info!(voucher_no = %record.voucher_no, "voucher appended");
            if let Some(notifier) = &state.notifier {
                notifier.spawn_transaction_alert(&record);
            }
            Ok(Json(ack))
        }
        CacheCommand::Delete { id } => {
            if id.trim().is_empty() {
                return Err(ApiError::missing_field("id"));
            }

            let result = state.ledger.delete_record(&id).await;
            state.cache.invalidate().await;
            let ack = result?;

            info!(voucher_no = %id, "voucher deleted");
            Ok(Json(ack))
        }
    }
}

/// POST /batch/submit - Append a batch of voucher rows in order.
///
/// All rows are validated up front; nothing is written if any row is
/// invalid. Appends then stop at the first ledger failure, and the
/// error reports how far the batch got so the client can retry the
/// remainder.
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchSubmitRequest>,
) -> ApiResult<Json<Value>> {
    let records: Vec<VoucherRecord> = request.records.iter().map(normalize::record).collect();
    let total = records.len();

    for (index, record) in records.iter().enumerate() {
        validate_record(record).map_err(|e| {
            ApiError::from(e).with_details(json!({ "failed_index": index, "total": total }))
        })?;
    }

    let mut submitted = 0usize;
    let mut failure: Option<(usize, ApiError)> = None;

    for (index, record) in records.iter().enumerate() {
        match state.ledger.append_record(record).await {
            Ok(_) => {
                submitted += 1;
                if let Some(notifier) = &state.notifier {
                    notifier.spawn_transaction_alert(record);
                }
            }
            Err(e) => {
                failure = Some((index, ApiError::from(e)));
                break;
            }
        }
    }

    // One invalidation per batch, after the last write.
    if submitted > 0 || failure.is_some() {
        state.cache.invalidate().await;
    }

    match failure {
        None => {
            info!(submitted, "batch submitted");
            Ok(Json(json!({ "submitted": submitted, "total": total })))
        }
        Some((index, error)) => {
            warn!(submitted, failed_index = index, total, "batch stopped on ledger failure");
            Err(error.with_details(json!({
                "submitted": submitted,
                "failed_index": index,
                "total": total,
            })))
        }
    }
}

fn validate_record(record: &VoucherRecord) -> Result<(), ValidationError> {
    if record.voucher_no.trim().is_empty() {
        return Err(ValidationError::missing("voucherno"));
    }
    if record.vendor.trim().is_empty() {
        return Err(ValidationError::missing("vendor"));
    }
    if record.item_description.trim().is_empty() {
        return Err(ValidationError::missing("item"));
    }
    if record.count <= 0.0 {
        return Err(ValidationError::invalid("count", "must be greater than zero"));
    }
    Ok(())
}

// ============================================================================
// ROUTERS
// ============================================================================

/// Create the snapshot read/write router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(read_cache).post(write_cache))
        .with_state(state)
}

/// Create the batch submit router.
pub fn create_batch_router(state: AppState) -> Router {
    Router::new()
        .route("/submit", post(submit_batch))
        .with_state(state)
}
