//! API integration tests for medverify-server.
//!
//! These tests exercise the HTTP API end to end against a router wired with
//! in-memory collaborators, covering the full verify flow, the stage
//! routes, and the error contract.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;

use medverify_core::{
    ExtractionStage, FailingNamer, FailingRegistry, MatchingStage, MemoryBlobStore,
    MemoryRecordStore, MockNamer, MockRecognizer, MockRegistry, ProductMatch, RegistrySession,
};
use medverify_server::{create_router, AppState};

struct TestApp {
    app: Router,
    store: Arc<MemoryRecordStore>,
    registry: Arc<MockRegistry>,
}

fn paracetamol_row() -> ProductMatch {
    ProductMatch {
        product_name: "Paracetamol 500mg Tablets".into(),
        active_ingredients: "Paracetamol".into(),
        product_category: "Drugs".into(),
        nrn: "A4-101466".into(),
        status: "Active".into(),
    }
}

/// Build a test router around in-memory collaborators, keeping handles to
/// the registry and record store for assertions.
fn test_app(recognizer: MockRecognizer, rows: Vec<ProductMatch>) -> TestApp {
    let registry = Arc::new(if rows.is_empty() {
        MockRegistry::empty()
    } else {
        MockRegistry::with_rows(rows)
    });
    let store = Arc::new(MemoryRecordStore::new());

    let extraction = Arc::new(ExtractionStage::new(
        Arc::new(MemoryBlobStore::new()),
        Arc::new(recognizer),
        Arc::new(MockNamer::new("Lisinopril")),
    ));
    let matching = Arc::new(MatchingStage::new(registry.clone(), store.clone()));

    TestApp {
        app: create_router(AppState::new(extraction, matching)),
        store,
        registry,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let TestApp { app, .. } = test_app(MockRecognizer::empty(), Vec::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_endpoint_returns_ok() {
    let TestApp { app, .. } = test_app(MockRecognizer::empty(), Vec::new());

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Verify Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_verify_with_operator_number_returns_match() {
    let TestApp {
        app,
        store,
        registry,
    } = test_app(MockRecognizer::empty(), vec![paracetamol_row()]);

    let body = json!({
        "image": BASE64.encode(b"packaging photo"),
        "registrationNumber": "A4-101466",
    });
    let response = app.oneshot(post_json("/verify", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    assert_eq!(json["registrationNumber"], "A4-101466");
    assert_eq!(json["validationResult"]["success"], true);
    assert_eq!(json["validationResult"]["found"], true);
    assert_eq!(
        json["validationResult"]["results"][0]["product_name"],
        "Paracetamol 500mg Tablets"
    );
    assert!(json["verificationId"].is_string());
    assert!(json["imageKey"].as_str().unwrap().starts_with("images/"));

    assert_eq!(registry.calls(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_verify_extracted_number_not_found() {
    let TestApp { app, .. } = test_app(
        MockRecognizer::with_lines(&[("NRN B4 - 1650", 96.0)]),
        Vec::new(),
    );

    let body = json!({ "image": BASE64.encode(b"photo") });
    let response = app.oneshot(post_json("/verify", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    // Normalized number, searched but not found; timeout is not an error.
    assert_eq!(json["registrationNumber"], "B4-1650");
    assert_eq!(json["validationResult"]["success"], true);
    assert_eq!(json["validationResult"]["found"], false);
    assert!(json["validationResult"]["message"]
        .as_str()
        .unwrap()
        .contains("registration number"));
}

#[tokio::test]
async fn test_verify_missing_image_is_invalid_input() {
    let TestApp {
        app,
        store,
        registry,
    } = test_app(MockRecognizer::empty(), Vec::new());

    let response = app.oneshot(post_json("/verify", json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
    assert!(json["error"].is_string());

    // The matching stage was never invoked and nothing was persisted.
    assert_eq!(registry.calls(), 0);
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_verify_garbage_base64_is_invalid_input() {
    let TestApp { app, .. } = test_app(MockRecognizer::empty(), Vec::new());

    let body = json!({ "image": "!!!not base64!!!" });
    let response = app.oneshot(post_json("/verify", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_verify_registry_outage_yields_unreachable_verdict() {
    let store = Arc::new(MemoryRecordStore::new());
    let extraction = Arc::new(ExtractionStage::new(
        Arc::new(MemoryBlobStore::new()),
        Arc::new(MockRecognizer::empty()),
        Arc::new(FailingNamer::default()),
    ));
    let registry: Arc<dyn RegistrySession> = Arc::new(FailingRegistry::new());
    let matching = Arc::new(MatchingStage::new(registry, store.clone()));
    let app = create_router(AppState::new(extraction, matching));

    let body = json!({
        "image": BASE64.encode(b"photo"),
        "registrationNumber": "A4-101466",
    });
    let response = app.oneshot(post_json("/verify", body)).await.unwrap();

    // Never a transport error: the outage collapses into a verdict.
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["validationResult"]["success"], true);
    assert_eq!(json["validationResult"]["found"], false);
    assert_eq!(json["validationResult"]["registryUnreachable"], true);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_verify_name_fallback_searches_by_name() {
    let TestApp { app, registry, .. } = test_app(
        MockRecognizer::with_lines(&[("no code on this label", 75.0)]),
        Vec::new(),
    );

    let body = json!({ "image": BASE64.encode(b"photo") });
    let response = app.oneshot(post_json("/verify", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["registrationNumber"].is_null());
    assert_eq!(json["validationResult"]["searchType"], "product name");
    assert_eq!(json["validationResult"]["searchTerm"], "Lisinopril");
    assert_eq!(registry.calls(), 1);
}

// ============================================================================
// Stage Route Tests
// ============================================================================

#[tokio::test]
async fn test_process_image_runs_extraction_only() {
    let TestApp {
        app,
        store,
        registry,
    } = test_app(MockRecognizer::with_lines(&[("A4-101466", 97.0)]), Vec::new());

    let body = json!({ "image": BASE64.encode(b"photo") });
    let response = app
        .oneshot(post_json("/process-image", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["registrationNumber"], "A4-101466");
    assert_eq!(json["ocrConfidence"], 97.0);
    assert!(json["verificationId"].is_string());

    // No matching, no record.
    assert_eq!(registry.calls(), 0);
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_validate_matches_and_persists() {
    let TestApp {
        app,
        store,
        registry,
    } = test_app(MockRecognizer::empty(), vec![paracetamol_row()]);

    let body = json!({
        "verificationId": "vid-7",
        "timestamp": "2026-08-06T10:00:00.000000",
        "imageKey": "images/2026-08-06T10:00:00.000000_vid-7.jpg",
        "registrationNumber": "A4-101466",
    });
    let response = app.oneshot(post_json("/validate", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["verificationId"], "vid-7");
    assert_eq!(json["validationResult"]["found"], true);

    assert_eq!(registry.calls(), 1);
    assert_eq!(store.get("vid-7").len(), 1);
}

#[tokio::test]
async fn test_validate_missing_identity_is_invalid_input() {
    let TestApp { app, store, .. } = test_app(MockRecognizer::empty(), Vec::new());

    let body = json!({
        "verificationId": "",
        "timestamp": "",
        "imageKey": "images/x.jpg",
        "registrationNumber": "A4-101466",
    });
    let response = app.oneshot(post_json("/validate", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
    assert_eq!(store.len(), 0);
}
