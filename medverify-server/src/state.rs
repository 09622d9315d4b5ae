//! Application state module
//!
//! Defines shared state accessible across all request handlers, and wires
//! the pipeline's collaborators from configuration.

use std::sync::Arc;

use medverify_core::{
    BlobStore, DynamoRecordStore, ExtractionStage, FailingNamer, HttpProductNamer, MatchingStage,
    MemoryBlobStore, MemoryRecordStore, MockRecognizer, MockRegistry, Orchestrator, ProductNamer,
    RecordStore, RegistryConfig, RegistrySession, S3BlobStore, TextRecognizer,
    TextractRecognizer, VisionConfig, WebDriverRegistry,
};

use crate::config::Config;

/// Application state containing the pipeline and its stages.
#[derive(Clone)]
pub struct AppState {
    /// Full pipeline entry point
    pub orchestrator: Arc<Orchestrator>,
    /// Extraction stage, exposed on its own route
    pub extraction: Arc<ExtractionStage>,
    /// Matching stage, exposed on its own route
    pub matching: Arc<MatchingStage>,
}

impl AppState {
    pub fn new(extraction: Arc<ExtractionStage>, matching: Arc<MatchingStage>) -> Self {
        Self {
            orchestrator: Arc::new(Orchestrator::new(extraction.clone(), matching.clone())),
            extraction,
            matching,
        }
    }
}

/// Wire the pipeline from configuration.
///
/// Production collaborators are used when configured; otherwise each falls
/// back to an in-memory stand-in so the server stays usable in development.
pub async fn build_state(config: &Config) -> AppState {
    let (blob_store, recognizer): (Arc<dyn BlobStore>, Arc<dyn TextRecognizer>) =
        match &config.image_bucket {
            Some(bucket) => {
                tracing::info!(bucket = %bucket, "using S3 image storage with Textract recognition");
                (
                    Arc::new(S3BlobStore::new(bucket.clone()).await),
                    Arc::new(TextractRecognizer::new(bucket.clone()).await),
                )
            }
            None => {
                tracing::warn!(
                    "IMAGE_BUCKET_NAME not set, using in-memory image storage - images will be lost on restart!"
                );
                (
                    Arc::new(MemoryBlobStore::new()),
                    Arc::new(MockRecognizer::empty()),
                )
            }
        };

    let namer: Arc<dyn ProductNamer> = match (&config.vision_endpoint, &config.vision_api_key) {
        (Some(endpoint), Some(api_key)) => {
            let vision = VisionConfig::new(endpoint.clone(), config.vision_model.clone(), api_key.clone());
            match HttpProductNamer::new(vision) {
                Ok(namer) => {
                    tracing::info!(model = %config.vision_model, "vision naming fallback enabled");
                    Arc::new(namer)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "vision client construction failed, naming disabled");
                    Arc::new(FailingNamer::new("vision client unavailable"))
                }
            }
        }
        _ => {
            tracing::warn!("VISION_API_URL/VISION_API_KEY not set, product naming disabled");
            Arc::new(FailingNamer::new("vision endpoint not configured"))
        }
    };

    let registry: Arc<dyn RegistrySession> = match &config.webdriver_url {
        Some(url) => {
            let registry_config = RegistryConfig::default()
                .with_webdriver_url(url.clone())
                .with_page_url(config.registry_page_url.clone());
            match WebDriverRegistry::new(registry_config) {
                Ok(session) => {
                    tracing::info!(webdriver = %url, page = %config.registry_page_url, "registry session enabled");
                    Arc::new(session)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "webdriver client construction failed, registry disabled");
                    Arc::new(MockRegistry::empty())
                }
            }
        }
        None => {
            tracing::warn!("WEBDRIVER_URL not set, registry searches will report not-found");
            Arc::new(MockRegistry::empty())
        }
    };

    let record_store: Arc<dyn RecordStore> = match &config.verification_table {
        Some(table) => {
            tracing::info!(table = %table, "using DynamoDB record storage");
            Arc::new(DynamoRecordStore::new(table.clone()).await)
        }
        None => {
            tracing::warn!(
                "VERIFICATION_TABLE_NAME not set, using in-memory record storage - records will be lost on restart!"
            );
            Arc::new(MemoryRecordStore::new())
        }
    };

    let extraction = Arc::new(ExtractionStage::new(blob_store, recognizer, namer));
    let matching = Arc::new(
        MatchingStage::new(registry, record_store).with_retention_days(config.retention_days),
    );

    AppState::new(extraction, matching)
}
