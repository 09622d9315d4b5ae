//! Medverify Core - pharmaceutical product verification pipeline
//!
//! This crate verifies packaged pharmaceutical products: it extracts a
//! regulatory registration number from a photograph of the packaging,
//! cross-references it (or a fallback product name) against the public
//! product registry, and durably records the outcome.
//!
//! # Pipeline
//!
//! - [`ExtractionStage`] persists the image and produces a registration
//!   number (pattern-matched over recognized text) or a best-effort product
//!   name (vision model fallback)
//! - [`MatchingStage`] drives a registry search session and persists a
//!   [`VerificationRecord`] with the structured verdict
//! - [`Orchestrator`] sequences the two stages and is the only component
//!   callers interact with
//!
//! External collaborators (blob store, text recognizer, vision model,
//! registry session, record store) are injected as trait objects so every
//! stage can be exercised against in-memory fakes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use medverify_core::{
//!     ExtractionStage, MatchingStage, MemoryBlobStore, MemoryRecordStore, MockNamer,
//!     MockRecognizer, MockRegistry, Orchestrator, VerificationRequest,
//! };
//!
//! # async fn example() -> medverify_core::Result<()> {
//! let extraction = Arc::new(ExtractionStage::new(
//!     Arc::new(MemoryBlobStore::new()),
//!     Arc::new(MockRecognizer::with_lines(&[("NRN A4-101466", 97.3)])),
//!     Arc::new(MockNamer::new("Paracetamol")),
//! ));
//! let matching = Arc::new(MatchingStage::new(
//!     Arc::new(MockRegistry::empty()),
//!     Arc::new(MemoryRecordStore::new()),
//! ));
//! let orchestrator = Orchestrator::new(extraction, matching);
//!
//! let request = VerificationRequest {
//!     image: Some("aGVsbG8=".to_string()),
//!     registration_number: None,
//! };
//! let response = orchestrator.verify(&request).await?;
//! println!("found: {}", response.validation_result.found);
//! # Ok(())
//! # }
//! ```

pub mod blob;
pub mod error;
pub mod extraction;
pub mod matching;
pub mod model;
pub mod orchestrator;
pub mod pattern;
pub mod recognize;
pub mod registry;
pub mod store;
pub mod vision;

// Re-export main types for convenience
pub use blob::{BlobError, BlobStore, MemoryBlobStore, S3BlobStore};
pub use error::{PipelineError, Result};
pub use extraction::ExtractionStage;
pub use matching::MatchingStage;
pub use model::{
    ExtractionOutput, ProductMatch, SearchMode, ValidationResult, VerificationRecord,
    VerificationRequest, VerificationResponse, DEFAULT_RETENTION_DAYS,
};
pub use orchestrator::{Orchestrator, PipelineState};
pub use pattern::NumberCandidate;
pub use recognize::{
    FailingRecognizer, MockRecognizer, RecognitionError, TextLine, TextRecognizer,
    TextractRecognizer,
};
pub use registry::{
    FailingRegistry, MockRegistry, RegistryConfig, RegistryError, RegistrySession, SearchOutcome,
    WebDriverRegistry,
};
pub use store::{DynamoRecordStore, MemoryRecordStore, RecordStore, StoreError};
pub use vision::{
    FailingNamer, HttpProductNamer, MockNamer, NamerError, ProductNamer, VisionConfig,
};
