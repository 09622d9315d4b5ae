//! End-to-end pipeline tests across stage boundaries, using in-memory
//! collaborators throughout.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use medverify_core::{
    ExtractionStage, FailingNamer, FailingRegistry, MatchingStage, MemoryBlobStore,
    MemoryRecordStore, MockNamer, MockRecognizer, MockRegistry, Orchestrator, ProductMatch,
    SearchMode, VerificationRequest,
};

fn paracetamol_row() -> ProductMatch {
    ProductMatch {
        product_name: "Paracetamol 500mg Tablets".into(),
        active_ingredients: "Paracetamol".into(),
        product_category: "Drugs".into(),
        nrn: "A4-101466".into(),
        status: "Active".into(),
    }
}

fn image_request() -> VerificationRequest {
    VerificationRequest {
        image: Some(BASE64.encode(b"packaging photo")),
        registration_number: None,
    }
}

struct Pipeline {
    orchestrator: Orchestrator,
    registry: Arc<MockRegistry>,
    store: Arc<MemoryRecordStore>,
    blob: Arc<MemoryBlobStore>,
}

fn build(recognizer: MockRecognizer, namer: MockNamer, rows: Vec<ProductMatch>) -> Pipeline {
    let blob = Arc::new(MemoryBlobStore::new());
    let registry = Arc::new(if rows.is_empty() {
        MockRegistry::empty()
    } else {
        MockRegistry::with_rows(rows)
    });
    let store = Arc::new(MemoryRecordStore::new());

    let extraction = Arc::new(ExtractionStage::new(
        blob.clone(),
        Arc::new(recognizer),
        Arc::new(namer),
    ));
    let matching = Arc::new(MatchingStage::new(registry.clone(), store.clone()));

    Pipeline {
        orchestrator: Orchestrator::new(extraction, matching),
        registry,
        store,
        blob,
    }
}

#[tokio::test]
async fn recognized_number_is_matched_and_recorded() {
    let pipeline = build(
        MockRecognizer::with_lines(&[("Paracetamol 500mg", 88.0), ("NRN A4 - 101466", 96.5)]),
        MockNamer::new("unused"),
        vec![paracetamol_row()],
    );

    let response = pipeline.orchestrator.verify(&image_request()).await.unwrap();

    // Normalized number searched in number mode.
    let (term, mode) = pipeline.registry.last_search().unwrap();
    assert_eq!(term, "A4-101466");
    assert_eq!(mode, SearchMode::RegistrationNumber);

    assert!(response.validation_result.found);
    assert_eq!(response.validation_result.results, vec![paracetamol_row()]);
    assert_eq!(response.registration_number.as_deref(), Some("A4-101466"));

    // The image blob and the verification record both exist.
    assert!(pipeline.blob.get(&response.image_key).is_some());
    let records = pipeline.store.get(&response.verification_id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].image_key, response.image_key);
    assert!(!pipeline
        .store
        .by_registration_number("A4-101466")
        .is_empty());
}

#[tokio::test]
async fn product_name_fallback_searches_by_name() {
    let pipeline = build(
        MockRecognizer::with_lines(&[("Some unreadable scrawl", 40.0)]),
        MockNamer::new("Lisinopril 10mg\nextra commentary"),
        Vec::new(),
    );

    let response = pipeline.orchestrator.verify(&image_request()).await.unwrap();

    let (term, mode) = pipeline.registry.last_search().unwrap();
    assert_eq!(term, "Lisinopril 10mg");
    assert_eq!(mode, SearchMode::ProductName);

    assert!(response.validation_result.success);
    assert!(!response.validation_result.found);
    // No number anywhere: the record exists but is absent from the number
    // index.
    assert_eq!(pipeline.store.len(), 1);
    assert!(pipeline.store.get(&response.verification_id)[0]
        .registration_number
        .is_none());
}

#[tokio::test]
async fn fully_degraded_extraction_still_completes_and_records() {
    let blob = Arc::new(MemoryBlobStore::new());
    let registry = Arc::new(MockRegistry::empty());
    let store = Arc::new(MemoryRecordStore::new());
    let extraction = Arc::new(ExtractionStage::new(
        blob,
        Arc::new(MockRecognizer::empty()),
        Arc::new(FailingNamer::default()),
    ));
    let matching = Arc::new(MatchingStage::new(registry.clone(), store.clone()));
    let orchestrator = Orchestrator::new(extraction, matching);

    let response = orchestrator.verify(&image_request()).await.unwrap();

    // Nothing to search: not an error, registry never consulted, record
    // still written.
    assert!(!response.validation_result.success);
    assert!(!response.validation_result.found);
    assert_eq!(registry.calls(), 0);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn registry_outage_never_surfaces_to_the_caller() {
    let blob = Arc::new(MemoryBlobStore::new());
    let store = Arc::new(MemoryRecordStore::new());
    let extraction = Arc::new(ExtractionStage::new(
        blob,
        Arc::new(MockRecognizer::empty()),
        Arc::new(MockNamer::new("unused")),
    ));
    let matching = Arc::new(MatchingStage::new(
        Arc::new(FailingRegistry::new()),
        store.clone(),
    ));
    let orchestrator = Orchestrator::new(extraction, matching);

    let request = VerificationRequest {
        image: Some(BASE64.encode(b"img")),
        registration_number: Some("A4-101466".into()),
    };
    let response = orchestrator.verify(&request).await.unwrap();

    let verdict = &response.validation_result;
    assert!(verdict.success);
    assert!(!verdict.found);
    assert!(verdict.registry_unreachable);
    assert_eq!(store.len(), 1);
}
