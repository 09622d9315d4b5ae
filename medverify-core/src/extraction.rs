//! Capture & extraction stage.
//!
//! Persists the source image and produces either a high-confidence
//! registration number or a best-effort product name. Recognition and
//! naming failures degrade to null fields; only a missing image or a failed
//! blob write surface as errors.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{error, info, instrument, warn};

use crate::blob::BlobStore;
use crate::error::{PipelineError, Result};
use crate::model::{self, ExtractionOutput, VerificationRequest};
use crate::pattern;
use crate::recognize::TextRecognizer;
use crate::vision::{self, ProductNamer};

/// Stage 1 of the pipeline.
pub struct ExtractionStage {
    blob_store: Arc<dyn BlobStore>,
    recognizer: Arc<dyn TextRecognizer>,
    namer: Arc<dyn ProductNamer>,
}

/// What recognition produced for one image.
#[derive(Debug, Default)]
struct Recognition {
    registration_number: Option<String>,
    ocr_confidence: Option<f64>,
    extracted_text: Option<String>,
    product_name: Option<String>,
}

/// Decode the request image, stripping any data-URL prefix first.
fn decode_image(image: Option<&str>) -> Result<Vec<u8>> {
    let encoded = image
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PipelineError::InvalidInput("missing image data".into()))?;

    // "data:image/jpeg;base64,..." → keep only the payload.
    let payload = match encoded.split_once(',') {
        Some((_, rest)) => rest,
        None => encoded,
    };

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| PipelineError::InvalidInput(format!("invalid base64 image data: {e}")))?;

    if bytes.is_empty() {
        return Err(PipelineError::InvalidInput("empty image data".into()));
    }
    Ok(bytes)
}

fn operator_number(request: &VerificationRequest) -> Option<String> {
    request
        .registration_number
        .as_ref()
        .filter(|n| !n.trim().is_empty())
        .cloned()
}

impl ExtractionStage {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        recognizer: Arc<dyn TextRecognizer>,
        namer: Arc<dyn ProductNamer>,
    ) -> Self {
        Self {
            blob_store,
            recognizer,
            namer,
        }
    }

    /// Run the stage: persist the image, then extract a registration number
    /// or product name.
    #[instrument(skip(self, request))]
    pub async fn process(&self, request: &VerificationRequest) -> Result<ExtractionOutput> {
        let image = decode_image(request.image.as_deref())?;

        let verification_id = model::new_verification_id();
        let timestamp = model::now_timestamp();
        let image_key = model::image_key(&timestamp, &verification_id);

        self.blob_store.put(&image_key, &image, "image/jpeg").await?;

        let recognition = match operator_number(request) {
            // Operator input is trusted unconditionally: recognition never
            // runs.
            Some(number) => Recognition {
                registration_number: Some(number),
                ..Recognition::default()
            },
            None => self.recognize(&image_key, &image).await,
        };

        info!(
            verification_id = %verification_id,
            registration_number = ?recognition.registration_number,
            product_name = ?recognition.product_name,
            "extraction complete"
        );

        Ok(ExtractionOutput {
            verification_id,
            timestamp,
            image_key,
            registration_number: recognition.registration_number,
            product_name: recognition.product_name,
            ocr_confidence: recognition.ocr_confidence,
            extracted_text: recognition.extracted_text,
        })
    }

    /// OCR then pattern scan; vision-name fallback on a pattern miss. Never
    /// fails: collaborator errors degrade to an empty result.
    async fn recognize(&self, image_key: &str, image: &[u8]) -> Recognition {
        let lines = match self.recognizer.detect_text(image_key).await {
            Ok(lines) => lines,
            Err(e) => {
                error!(error = %e, "text recognition failed");
                return Recognition::default();
            }
        };

        let full_text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if let Some(best) = pattern::best_candidate(&lines) {
            info!(number = %best.number, confidence = best.confidence, "registration number recognized");
            return Recognition {
                registration_number: Some(best.number),
                ocr_confidence: Some(best.confidence),
                extracted_text: Some(full_text),
                product_name: None,
            };
        }

        warn!("no registration number recognized, asking vision model for a product name");
        let context = (!full_text.trim().is_empty()).then_some(full_text.as_str());
        let product_name = match self.namer.name_product(image, context).await {
            Ok(reply) => vision::clean_name(&reply),
            Err(e) => {
                warn!(error = %e, "product naming failed");
                None
            }
        };

        Recognition {
            registration_number: None,
            ocr_confidence: None,
            extracted_text: Some(full_text),
            product_name,
        }
    }
}
