//! Verification pipeline orchestrator.
//!
//! Pure sequencing: extraction, then matching, with no retries and no
//! branching back. Extraction errors surface verbatim; a matching-stage
//! failure surfaces as a distinct downstream error.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::extraction::ExtractionStage;
use crate::matching::MatchingStage;
use crate::model::{VerificationRequest, VerificationResponse};

/// Pipeline progress states. Linear; `Completed`, `ExtractionFailed` and
/// `MatchingFailed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Extracting,
    Extracted,
    Matching,
    Completed,
    ExtractionFailed,
    MatchingFailed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Received => "received",
            PipelineState::Extracting => "extracting",
            PipelineState::Extracted => "extracted",
            PipelineState::Matching => "matching",
            PipelineState::Completed => "completed",
            PipelineState::ExtractionFailed => "extraction_failed",
            PipelineState::MatchingFailed => "matching_failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single entry point callers interact with.
pub struct Orchestrator {
    extraction: Arc<ExtractionStage>,
    matching: Arc<MatchingStage>,
}

impl Orchestrator {
    pub fn new(extraction: Arc<ExtractionStage>, matching: Arc<MatchingStage>) -> Self {
        Self {
            extraction,
            matching,
        }
    }

    /// Run the full pipeline for one request.
    #[instrument(skip(self, request))]
    pub async fn verify(&self, request: &VerificationRequest) -> Result<VerificationResponse> {
        debug!(state = %PipelineState::Received, "verification request received");

        debug!(state = %PipelineState::Extracting, "invoking extraction stage");
        let extracted = match self.extraction.process(request).await {
            Ok(output) => output,
            Err(err) => {
                // Surfaced verbatim; the matching stage is never invoked.
                warn!(state = %PipelineState::ExtractionFailed, error = %err, "extraction failed");
                return Err(err);
            }
        };

        info!(
            state = %PipelineState::Extracted,
            verification_id = %extracted.verification_id,
            registration_number = ?extracted.registration_number,
            product_name = ?extracted.product_name,
            "extraction stage done"
        );

        debug!(state = %PipelineState::Matching, "invoking matching stage");
        let response = self.matching.validate(&extracted).await.map_err(|err| {
            error!(state = %PipelineState::MatchingFailed, error = %err, "matching stage could not be completed");
            PipelineError::MatchingUnavailable(err.to_string())
        })?;

        info!(
            state = %PipelineState::Completed,
            verification_id = %response.verification_id,
            found = response.validation_result.found,
            "verification completed"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::model::ProductMatch;
    use crate::recognize::MockRecognizer;
    use crate::registry::{MockRegistry, RegistrySession};
    use crate::store::{MemoryRecordStore, RecordStore, StoreError};
    use crate::vision::MockNamer;

    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn put(
            &self,
            _record: &crate::model::VerificationRecord,
        ) -> std::result::Result<(), StoreError> {
            Err(StoreError::Write("store offline".into()))
        }
    }

    fn pipeline(
        registry: Arc<dyn RegistrySession>,
        store: Arc<dyn RecordStore>,
    ) -> (Orchestrator, Arc<MockRecognizer>) {
        let recognizer = Arc::new(MockRecognizer::with_lines(&[("A4-101466", 97.5)]));
        let extraction = Arc::new(ExtractionStage::new(
            Arc::new(MemoryBlobStore::new()),
            recognizer.clone(),
            Arc::new(MockNamer::new("unused")),
        ));
        let matching = Arc::new(MatchingStage::new(registry, store));
        (Orchestrator::new(extraction, matching), recognizer)
    }

    fn request_with_image() -> VerificationRequest {
        VerificationRequest {
            image: Some(BASE64.encode(b"img")),
            registration_number: None,
        }
    }

    #[tokio::test]
    async fn end_to_end_with_operator_number() {
        let row = ProductMatch {
            product_name: "Paracetamol 500mg Tablets".into(),
            active_ingredients: "Paracetamol".into(),
            product_category: "Drugs".into(),
            nrn: "A4-101466".into(),
            status: "Active".into(),
        };
        let registry = Arc::new(MockRegistry::with_rows(vec![row]));
        let store = Arc::new(MemoryRecordStore::new());
        let (orchestrator, _) = pipeline(registry, store.clone());

        let request = VerificationRequest {
            image: Some(BASE64.encode(b"img")),
            registration_number: Some("A4-101466".into()),
        };
        let response = orchestrator.verify(&request).await.unwrap();

        assert!(response.validation_result.success);
        assert!(response.validation_result.found);
        assert_eq!(response.registration_number.as_deref(), Some("A4-101466"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn extracted_number_flows_into_matching() {
        let registry = Arc::new(MockRegistry::empty());
        let store = Arc::new(MemoryRecordStore::new());
        let (orchestrator, recognizer) = pipeline(registry.clone(), store);

        let response = orchestrator.verify(&request_with_image()).await.unwrap();

        assert_eq!(recognizer.calls(), 1);
        let (term, _) = registry.last_search().unwrap();
        assert_eq!(term, "A4-101466");
        assert!(!response.validation_result.found);
    }

    #[tokio::test]
    async fn missing_image_short_circuits_before_matching() {
        let registry = Arc::new(MockRegistry::empty());
        let store = Arc::new(MemoryRecordStore::new());
        let (orchestrator, _) = pipeline(registry.clone(), store.clone());

        let err = orchestrator
            .verify(&VerificationRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(registry.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn matching_failure_surfaces_as_downstream_error() {
        let registry = Arc::new(MockRegistry::empty());
        let (orchestrator, _) = pipeline(registry, Arc::new(BrokenStore));

        let err = orchestrator.verify(&request_with_image()).await.unwrap_err();
        assert!(matches!(err, PipelineError::MatchingUnavailable(_)));
    }
}
