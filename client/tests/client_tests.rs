//! Dashboard client tests
//!
//! - Responses decode enveloped or bare, errors map onto the taxonomy
//! - Invalid requests fail before any network call
//! - Pollers merge into caches and stop when dropped
//! - Checklist toggles report when the change was not saved

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use shared::{AdjustmentType, ComplianceCheck, CreateAdjustmentRequest, CreateGrnRequest, Grn, GrnStatus};
use uuid::Uuid;
use warehouse_ops_client::{
    checklist::toggle_with, write_through, ApiClient, ClientConfig, ClientError, EntityCache,
    MergeOutcome, Poller, Screen,
};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

fn client_for(base_url: String) -> ApiClient {
    ApiClient::new(&ClientConfig {
        base_url,
        ..ClientConfig::default()
    })
    .unwrap()
}

/// A client whose server never answers
fn offline_client() -> ApiClient {
    client_for("http://127.0.0.1:1/api/v1".to_string())
}

fn grn_json(id: Uuid, version: i64) -> Value {
    json!({
        "id": id,
        "poNumber": "PO-9001",
        "vendor": "Acme",
        "items": 40,
        "status": "completed",
        "discrepancyType": null,
        "discrepancyNotes": null,
        "putawayPallets": 10,
        "version": version,
        "createdAt": "2024-06-01T08:00:00Z",
        "updatedAt": "2024-06-01T09:00:00Z"
    })
}

fn compliance_check(completed: bool) -> ComplianceCheck {
    ComplianceCheck {
        id: Uuid::new_v4(),
        title: "Fire exits clear".to_string(),
        category: "Safety".to_string(),
        completed,
        completed_at: None,
        version: 4,
        updated_at: Utc::now(),
    }
}

// ============================================================================
// API client
// ============================================================================

#[tokio::test]
async fn test_list_accepts_envelope() {
    let id = Uuid::new_v4();
    let body = json!({ "success": true, "data": [grn_json(id, 3)] });
    let base = serve(Router::new().route(
        "/api/v1/warehouse/inbound/grns",
        get(move || async move { Json(body) }),
    ))
    .await;

    let grns: Vec<Grn> = client_for(base).list_grns().await.unwrap();
    assert_eq!(grns.len(), 1);
    assert_eq!(grns[0].id, id);
    assert_eq!(grns[0].status, GrnStatus::Completed);
}

#[tokio::test]
async fn test_list_accepts_bare_array() {
    let id = Uuid::new_v4();
    let body = json!([grn_json(id, 1)]);
    let base = serve(Router::new().route(
        "/api/v1/warehouse/inbound/grns",
        get(move || async move { Json(body) }),
    ))
    .await;

    let grns = client_for(base).list_grns().await.unwrap();
    assert_eq!(grns[0].po_number, "PO-9001");
}

#[tokio::test]
async fn test_rejected_transition_maps_to_invalid_transition() {
    let base = serve(Router::new().route(
        "/api/v1/warehouse/inbound/grns/:id/complete",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "success": false,
                    "error": {
                        "code": "INVALID_STATE_TRANSITION",
                        "message": "GRN cannot move from 'pending' to 'completed'"
                    }
                })),
            )
        }),
    ))
    .await;

    let err = client_for(base)
        .complete_grn(Uuid::new_v4(), Some(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidTransition(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_blank_po_number_fails_before_sending() {
    let request = CreateGrnRequest {
        po_number: " ".to_string(),
        vendor: "Acme".to_string(),
        items: 40,
    };
    let err = offline_client().create_grn(&request).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_zero_adjustment_fails_before_sending() {
    let request = CreateAdjustmentRequest {
        sku: "SKU-7".to_string(),
        change: 0,
        reason: "recount".to_string(),
        adjustment_type: AdjustmentType::Correction,
        location: None,
    };
    match offline_client().create_adjustment(&request).await {
        Err(ClientError::Validation { field, .. }) => assert_eq!(field, "change"),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let err = offline_client().list_grns().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
    assert!(err.is_transient());
}

// ============================================================================
// Polling
// ============================================================================

#[tokio::test]
async fn test_poller_fills_cache_and_stops_on_drop() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let id = Uuid::new_v4();
    let base = serve(Router::new().route(
        "/api/v1/warehouse/inbound/grns",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "success": true, "data": [grn_json(id, 2)] }))
            }
        }),
    ))
    .await;

    let api = client_for(base);
    let cache = EntityCache::<Grn>::shared();
    let poller = Poller::spawn(Screen::Inbound, Duration::from_millis(40), cache.clone(), move || {
        let api = api.clone();
        async move { api.list_grns().await }
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(poller.is_running());
    assert_eq!(cache.lock().await.get(&id).map(|g| g.version), Some(2));

    drop(poller);
    let at_drop = hits.load(Ordering::SeqCst);
    assert!(at_drop >= 2);

    tokio::time::sleep(Duration::from_millis(300)).await;
    // At most the request already on the wire lands after the abort
    assert!(hits.load(Ordering::SeqCst) <= at_drop + 1);
}

#[tokio::test]
async fn test_failed_write_releases_pending_key() {
    let cache = EntityCache::<ComplianceCheck>::shared();
    let check = compliance_check(false);
    let id = check.id;
    cache.lock().await.confirm_write(check);

    let result = write_through(&cache, id, async {
        Err::<ComplianceCheck, _>(ClientError::Conflict("stale".to_string()))
    })
    .await;

    assert!(matches!(result, Err(ClientError::Conflict(_))));
    assert!(!cache.lock().await.is_pending(&id));
}

// ============================================================================
// Compliance checklist
// ============================================================================

#[tokio::test]
async fn test_toggle_reports_non_durable_flip_on_failure() {
    let cache = EntityCache::<ComplianceCheck>::shared();
    let check = compliance_check(false);
    let id = check.id;
    cache.lock().await.confirm_write(check.clone());

    let outcome = toggle_with(&cache, id, |request| async move {
        assert!(request.completed);
        assert_eq!(request.expected_version, Some(4));
        Err(ClientError::Unexpected {
            status: 503,
            message: "unavailable".to_string(),
        })
    })
    .await
    .unwrap();

    assert!(!outcome.durable);
    assert!(outcome.check.completed);
    assert!(outcome.notice.is_some());
    assert_eq!(cache.lock().await.get(&id).map(|c| c.completed), Some(true));

    // The next poll brings back the server's value
    let mut guard = cache.lock().await;
    let ticket = guard.begin_fetch();
    assert!(matches!(guard.apply_snapshot(ticket, vec![check]), MergeOutcome::Applied(_)));
    assert_eq!(guard.get(&id).map(|c| c.completed), Some(false));
}

#[tokio::test]
async fn test_toggle_stores_server_answer() {
    let cache = EntityCache::<ComplianceCheck>::shared();
    let check = compliance_check(false);
    let id = check.id;
    cache.lock().await.confirm_write(check.clone());

    let outcome = toggle_with(&cache, id, |request| {
        let mut saved = check.clone();
        async move {
            saved.set_completed(request.completed, Utc::now());
            saved.version += 1;
            Ok(saved)
        }
    })
    .await
    .unwrap();

    assert!(outcome.durable);
    assert_eq!(outcome.check.version, 5);
    assert_eq!(cache.lock().await.get(&id).map(|c| c.version), Some(5));
}

#[tokio::test]
async fn test_toggle_unknown_check_is_not_found() {
    let cache = EntityCache::<ComplianceCheck>::shared();
    let result = toggle_with(&cache, Uuid::new_v4(), |_| async {
        Err::<ComplianceCheck, _>(ClientError::NotFound("unreachable".to_string()))
    })
    .await;
    assert!(matches!(result, Err(ClientError::NotFound(_))));
}
