//! End-to-end route tests against an in-memory ledger.
//!
//! The router is exercised through `tower::ServiceExt::oneshot`, with
//! the remote ledger replaced by [`InMemoryLedger`] on both the fetch
//! and write seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use voucherd_api::{create_api_router, AppConfig, AppState, LedgerWriter};
use voucherd_cache::{CacheConfig, SnapshotCache, SnapshotFetcher};
use voucherd_core::{LedgerError, Snapshot, VoucherRecord};

#[derive(Default)]
struct InMemoryLedger {
    fetches: AtomicUsize,
    appends: AtomicUsize,
    rows: Mutex<Vec<VoucherRecord>>,
    /// When set, every fetch fails this way.
    fetch_failure: Option<LedgerError>,
    /// Appends with index >= this value fail.
    fail_appends_from: Option<usize>,
}

impl InMemoryLedger {
    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SnapshotFetcher for InMemoryLedger {
    async fn fetch_snapshot(&self) -> Result<Snapshot, LedgerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.fetch_failure {
            return Err(failure.clone());
        }
        Ok(Snapshot {
            vouchers: self.rows.lock().unwrap().clone(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl LedgerWriter for InMemoryLedger {
    async fn append_record(&self, record: &VoucherRecord) -> Result<Value, LedgerError> {
        let index = self.appends.fetch_add(1, Ordering::SeqCst);
        if matches!(self.fail_appends_from, Some(from) if index >= from) {
            return Err(LedgerError::upstream("ledger rejected the row"));
        }
        self.rows.lock().unwrap().push(record.clone());
        Ok(json!({ "status": "ok", "voucherno": record.voucher_no }))
    }

    async fn delete_record(&self, voucher_no: &str) -> Result<Value, LedgerError> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|r| r.voucher_no != voucher_no);
        Ok(json!({ "status": "deleted", "voucherno": voucher_no }))
    }
}

fn build_app(ledger: Arc<InMemoryLedger>) -> Router {
    let cache = SnapshotCache::new(ledger.clone(), CacheConfig::default());
    let state = AppState::new(cache, ledger, None);
    create_api_router(state, &AppConfig::for_ledger("http://ledger.test/exec"))
}

fn get_cache() -> Request<Body> {
    Request::builder()
        .uri("/cache")
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_record(voucher_no: &str) -> Value {
    json!({
        "voucherno": voucher_no,
        "date": "2026-03-14",
        "vendor": "Ace Hardware",
        "item": "Paint",
        "count": 2,
        "cost_piece": 12000,
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn x_cache(response: &axum::response::Response) -> String {
    response
        .headers()
        .get("x-cache")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_read_miss_then_hit() {
    let ledger = Arc::new(InMemoryLedger::default());
    let app = build_app(ledger.clone());

    let first = app.clone().oneshot(get_cache()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(x_cache(&first), "MISS");

    let second = app.oneshot(get_cache()).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(x_cache(&second), "HIT");

    assert_eq!(ledger.fetches(), 1);
}

#[tokio::test]
async fn test_cold_cache_timeout_returns_503() {
    let ledger = Arc::new(InMemoryLedger {
        fetch_failure: Some(LedgerError::Timeout {
            limit: std::time::Duration::from_secs(15),
        }),
        ..Default::default()
    });
    let app = build_app(ledger);

    let response = app.oneshot(get_cache()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["error"], "timeout");
    assert_eq!(body["records"], json!([]));
}

#[tokio::test]
async fn test_cold_cache_upstream_failure_returns_503() {
    let ledger = Arc::new(InMemoryLedger {
        fetch_failure: Some(LedgerError::upstream("HTTP 500")),
        ..Default::default()
    });
    let app = build_app(ledger);

    let response = app.oneshot(get_cache()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["error"], "fetch_failed");
}

#[tokio::test]
async fn test_append_invalidates_cache() {
    let ledger = Arc::new(InMemoryLedger::default());
    let app = build_app(ledger.clone());

    // Warm the cache.
    app.clone().oneshot(get_cache()).await.unwrap();
    assert_eq!(ledger.fetches(), 1);

    let write = app
        .clone()
        .oneshot(post_json(
            "/cache",
            json!({ "action": "append", "record": valid_record("EXP-03-008") }),
        ))
        .await
        .unwrap();
    assert_eq!(write.status(), StatusCode::OK);
    assert_eq!(ledger.row_count(), 1);

    // The write dropped the cached snapshot, so this read refetches.
    let read = app.oneshot(get_cache()).await.unwrap();
    assert_eq!(x_cache(&read), "MISS");
    assert_eq!(ledger.fetches(), 2);

    let body = body_json(read).await;
    assert_eq!(body["vouchers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_append_still_invalidates() {
    let ledger = Arc::new(InMemoryLedger {
        fail_appends_from: Some(0),
        ..Default::default()
    });
    let app = build_app(ledger.clone());

    app.clone().oneshot(get_cache()).await.unwrap();
    assert_eq!(ledger.fetches(), 1);

    let write = app
        .clone()
        .oneshot(post_json(
            "/cache",
            json!({ "action": "append", "record": valid_record("EXP-03-009") }),
        ))
        .await
        .unwrap();
    assert_eq!(write.status(), StatusCode::BAD_GATEWAY);

    let read = app.oneshot(get_cache()).await.unwrap();
    assert_eq!(x_cache(&read), "MISS");
    assert_eq!(ledger.fetches(), 2);
}

#[tokio::test]
async fn test_append_validation_failure() {
    let ledger = Arc::new(InMemoryLedger::default());
    let app = build_app(ledger.clone());

    let mut record = valid_record("EXP-03-008");
    record["vendor"] = json!("");

    let response = app
        .oneshot(post_json("/cache", json!({ "action": "append", "record": record })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ledger.row_count(), 0);

    let body = body_json(response).await;
    assert_eq!(body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn test_delete_accepts_legacy_body() {
    let ledger = Arc::new(InMemoryLedger::default());
    ledger.rows.lock().unwrap().push(VoucherRecord {
        voucher_no: "EXP-03-008".to_string(),
        ..Default::default()
    });
    let app = build_app(ledger.clone());

    let response = app
        .oneshot(post_json(
            "/cache",
            json!({ "action": "delete", "voucherno": "EXP-03-008" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ledger.row_count(), 0);
}

#[tokio::test]
async fn test_unknown_action_is_400() {
    let app = build_app(Arc::new(InMemoryLedger::default()));

    let response = app
        .oneshot(post_json("/cache", json!({ "action": "truncate" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_submit_success() {
    let ledger = Arc::new(InMemoryLedger::default());
    let app = build_app(ledger.clone());

    let response = app
        .oneshot(post_json(
            "/batch/submit",
            json!({ "records": [valid_record("EXP-03-008"), valid_record("EXP-03-009")] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["submitted"], 2);
    assert_eq!(body["total"], 2);
    assert_eq!(ledger.row_count(), 2);
}

#[tokio::test]
async fn test_batch_submit_stops_on_first_failure() {
    let ledger = Arc::new(InMemoryLedger {
        fail_appends_from: Some(1),
        ..Default::default()
    });
    let app = build_app(ledger.clone());

    let response = app
        .oneshot(post_json(
            "/batch/submit",
            json!({ "records": [
                valid_record("EXP-03-008"),
                valid_record("EXP-03-009"),
                valid_record("EXP-03-010"),
            ] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["details"]["submitted"], 1);
    assert_eq!(body["details"]["failed_index"], 1);
    assert_eq!(body["details"]["total"], 3);

    // Only the row before the failure landed.
    assert_eq!(ledger.row_count(), 1);
}

#[tokio::test]
async fn test_batch_rejects_invalid_row_before_writing() {
    let ledger = Arc::new(InMemoryLedger::default());
    let app = build_app(ledger.clone());

    let mut bad = valid_record("EXP-03-009");
    bad["count"] = json!(0);

    let response = app
        .oneshot(post_json(
            "/batch/submit",
            json!({ "records": [valid_record("EXP-03-008"), bad] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["details"]["failed_index"], 1);
    assert_eq!(ledger.row_count(), 0);
}

#[tokio::test]
async fn test_health_ready_reports_cache_warmth() {
    let ledger = Arc::new(InMemoryLedger::default());
    let app = build_app(ledger);

    let cold = app
        .clone()
        .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(cold.status(), StatusCode::OK);
    let body = body_json(cold).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["details"]["cache"]["warm"], false);

    app.clone().oneshot(get_cache()).await.unwrap();

    let warm = app
        .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(warm).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["details"]["cache"]["warm"], true);
}
