//! AWS Textract text recognizer.

use async_trait::async_trait;
use aws_sdk_textract::types::{BlockType, Document, S3Object};
use tracing::{debug, error};

use super::{RecognitionError, TextLine, TextRecognizer};

/// Recognizer running Textract document-text detection against objects in a
/// single bucket.
pub struct TextractRecognizer {
    client: aws_sdk_textract::Client,
    bucket: String,
}

impl std::fmt::Debug for TextractRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextractRecognizer")
            .field("bucket", &self.bucket)
            .field("client", &"<TextractClient>")
            .finish()
    }
}

impl TextractRecognizer {
    /// Build a recognizer from ambient AWS configuration.
    pub async fn new(bucket: impl Into<String>) -> Self {
        let sdk_config = aws_config::load_from_env().await;
        Self {
            client: aws_sdk_textract::Client::new(&sdk_config),
            bucket: bucket.into(),
        }
    }

    /// Build a recognizer from a pre-built client (for testing).
    pub fn with_client(client: aws_sdk_textract::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl TextRecognizer for TextractRecognizer {
    async fn detect_text(&self, image_key: &str) -> Result<Vec<TextLine>, RecognitionError> {
        debug!(bucket = %self.bucket, key = %image_key, "running text detection");

        let document = Document::builder()
            .s3_object(
                S3Object::builder()
                    .bucket(&self.bucket)
                    .name(image_key)
                    .build(),
            )
            .build();

        let output = self
            .client
            .detect_document_text()
            .document(document)
            .send()
            .await
            .map_err(|e| {
                error!(bucket = %self.bucket, key = %image_key, error = %e, "text detection failed");
                RecognitionError::Service(e.to_string())
            })?;

        let lines = output
            .blocks()
            .iter()
            .filter(|block| block.block_type() == Some(&BlockType::Line))
            .filter_map(|block| {
                block.text().map(|text| TextLine {
                    text: text.to_string(),
                    confidence: f64::from(block.confidence().unwrap_or(0.0)),
                })
            })
            .collect();

        Ok(lines)
    }
}
