//! Registry matching stage.
//!
//! Wraps the fragile registry session: a results-table timeout is a
//! definitive not-found, a session failure becomes an explicit
//! registry-unreachable verdict, and a verification record is persisted on
//! every path that produced a verdict.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::model::{
    self, ExtractionOutput, SearchMode, ValidationResult, VerificationRecord, VerificationResponse,
    DEFAULT_RETENTION_DAYS,
};
use crate::registry::{RegistrySession, SearchOutcome};
use crate::store::RecordStore;

/// Stage 2 of the pipeline.
pub struct MatchingStage {
    registry: Arc<dyn RegistrySession>,
    record_store: Arc<dyn RecordStore>,
    retention_days: i64,
}

impl MatchingStage {
    pub fn new(registry: Arc<dyn RegistrySession>, record_store: Arc<dyn RecordStore>) -> Self {
        Self {
            registry,
            record_store,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }

    #[must_use]
    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    /// Run the stage: search the registry and persist the outcome.
    #[instrument(skip(self, input), fields(verification_id = %input.verification_id))]
    pub async fn validate(&self, input: &ExtractionOutput) -> Result<VerificationResponse> {
        if input.verification_id.trim().is_empty() || input.timestamp.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "missing verification id or timestamp".into(),
            ));
        }

        let number = input
            .registration_number
            .as_deref()
            .filter(|s| !s.trim().is_empty());
        let name = input
            .product_name
            .as_deref()
            .filter(|s| !s.trim().is_empty());

        // Number search always takes priority when both are present.
        let validation_result = match (number, name) {
            (Some(term), _) => {
                self.search(term, SearchMode::RegistrationNumber, number)
                    .await
            }
            (None, Some(term)) => self.search(term, SearchMode::ProductName, None).await,
            (None, None) => {
                warn!("no registration number or product name to search with");
                ValidationResult::nothing_to_search()
            }
        };

        let record = VerificationRecord {
            verification_id: input.verification_id.clone(),
            timestamp: input.timestamp.clone(),
            image_key: input.image_key.clone(),
            registration_number: number.map(str::to_string),
            validation_result,
            expires_at: model::retention_deadline(self.retention_days),
        };

        // One durable write per call, fallback verdicts included.
        self.record_store.put(&record).await?;

        Ok(VerificationResponse {
            verification_id: record.verification_id,
            timestamp: record.timestamp,
            image_key: record.image_key,
            registration_number: record.registration_number,
            validation_result: record.validation_result,
        })
    }

    /// Run one registry search. Never fails: session errors collapse into
    /// the unreachable verdict, without a retry.
    async fn search(
        &self,
        term: &str,
        mode: SearchMode,
        number: Option<&str>,
    ) -> ValidationResult {
        info!(term = %term, mode = %mode, "searching registry");
        match self.registry.search(term, mode).await {
            Ok(SearchOutcome::Rows(rows)) => {
                info!(matches = rows.len(), "registry matched");
                ValidationResult::found(term, mode, number, rows)
            }
            Ok(SearchOutcome::NoResults) => {
                info!("registry search completed with no match");
                ValidationResult::not_found(term, mode, number)
            }
            Err(e) => {
                error!(error = %e, "registry session failed");
                ValidationResult::unreachable(term, mode, number, &e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductMatch;
    use crate::registry::{FailingRegistry, MockRegistry};
    use crate::store::MemoryRecordStore;

    fn input(number: Option<&str>, name: Option<&str>) -> ExtractionOutput {
        ExtractionOutput {
            verification_id: "vid-1".into(),
            timestamp: "2026-01-02T03:04:05.000006".into(),
            image_key: "images/2026-01-02T03:04:05.000006_vid-1.jpg".into(),
            registration_number: number.map(str::to_string),
            product_name: name.map(str::to_string),
            ocr_confidence: None,
            extracted_text: None,
        }
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

    #[tokio::test]
    async fn number_search_takes_priority_over_name() {
        let registry = Arc::new(MockRegistry::with_rows(vec![paracetamol_row()]));
        let store = Arc::new(MemoryRecordStore::new());
        let stage = MatchingStage::new(registry.clone(), store);

        let response = stage
            .validate(&input(Some("A4-101466"), Some("Paracetamol")))
            .await
            .unwrap();

        let (term, mode) = registry.last_search().unwrap();
        assert_eq!(term, "A4-101466");
        assert_eq!(mode, SearchMode::RegistrationNumber);
        assert!(response.validation_result.found);
        assert_eq!(response.validation_result.results, vec![paracetamol_row()]);
    }

    #[tokio::test]
    async fn name_search_when_no_number() {
        let registry = Arc::new(MockRegistry::empty());
        let stage = MatchingStage::new(registry.clone(), Arc::new(MemoryRecordStore::new()));

        stage
            .validate(&input(None, Some("Lisinopril")))
            .await
            .unwrap();

        let (term, mode) = registry.last_search().unwrap();
        assert_eq!(term, "Lisinopril");
        assert_eq!(mode, SearchMode::ProductName);
    }

    #[tokio::test]
    async fn results_timeout_is_a_definitive_not_found() {
        let stage = MatchingStage::new(
            Arc::new(MockRegistry::empty()),
            Arc::new(MemoryRecordStore::new()),
        );

        let response = stage.validate(&input(Some("Z9-00000"), None)).await.unwrap();
        let verdict = &response.validation_result;
        assert!(verdict.success);
        assert!(!verdict.found);
        assert!(!verdict.registry_unreachable);
        assert!(verdict
            .message
            .as_deref()
            .unwrap()
            .contains("registration number"));
    }

    #[tokio::test]
    async fn session_failure_yields_unreachable_verdict_and_still_persists() {
        let store = Arc::new(MemoryRecordStore::new());
        let stage = MatchingStage::new(Arc::new(FailingRegistry::new()), store.clone());

        let response = stage.validate(&input(Some("A4-101466"), None)).await.unwrap();
        let verdict = &response.validation_result;
        assert!(verdict.success);
        assert!(!verdict.found);
        assert!(verdict.registry_unreachable);
        assert_eq!(store.len(), 1);
        assert!(store.get("vid-1")[0].validation_result.registry_unreachable);
    }

    #[tokio::test]
    async fn nothing_to_search_still_writes_a_record() {
        let registry = Arc::new(MockRegistry::empty());
        let store = Arc::new(MemoryRecordStore::new());
        let stage = MatchingStage::new(registry.clone(), store.clone());

        let response = stage.validate(&input(None, None)).await.unwrap();
        let verdict = &response.validation_result;
        assert!(!verdict.success);
        assert!(!verdict.found);
        assert_eq!(registry.calls(), 0);
        assert_eq!(store.len(), 1);
        // No number: the record is omitted from the number index.
        assert!(store.by_registration_number("A4-101466").is_empty());
    }

    #[tokio::test]
    async fn repeated_validation_appends_distinct_records() {
        let store = Arc::new(MemoryRecordStore::new());
        let stage = MatchingStage::new(Arc::new(MockRegistry::empty()), store.clone());

        let request = input(Some("A4-101466"), None);
        stage.validate(&request).await.unwrap();
        stage.validate(&request).await.unwrap();

        let records = store.get("vid-1");
        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(record.validation_result.success);
            assert!(!record.validation_result.found);
        }
    }

    #[tokio::test]
    async fn missing_identity_is_invalid_input_and_nothing_runs() {
        let registry = Arc::new(MockRegistry::empty());
        let store = Arc::new(MemoryRecordStore::new());
        let stage = MatchingStage::new(registry.clone(), store.clone());

        let mut bad = input(Some("A4-101466"), None);
        bad.verification_id = String::new();

        let err = stage.validate(&bad).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(registry.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn retention_deadline_is_about_ninety_days_out() {
        let store = Arc::new(MemoryRecordStore::new());
        let stage = MatchingStage::new(Arc::new(MockRegistry::empty()), store.clone());

        stage.validate(&input(Some("A4-101466"), None)).await.unwrap();

        let record = &store.get("vid-1")[0];
        let now = chrono::Utc::now().timestamp();
        let ninety_days = 90 * 24 * 60 * 60;
        assert!(record.expires_at > now + ninety_days - 60);
        assert!(record.expires_at <= now + ninety_days + 60);
    }
}
