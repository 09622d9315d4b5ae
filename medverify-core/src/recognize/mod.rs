//! Text recognition over stored images.
//!
//! Recognizers read the image by blob reference and return per-line text
//! with a confidence score on a 0..=100 scale.

mod mock;
mod textract;

pub use mock::{FailingRecognizer, MockRecognizer};
pub use textract::TextractRecognizer;

use async_trait::async_trait;
use thiserror::Error;

/// One recognized line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Recognition confidence in percent.
    pub confidence: f64,
}

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("text recognition failed: {0}")]
    Service(String),

    #[error("recognizer configuration error: {0}")]
    Configuration(String),
}

/// Text recognition service, reading the stored image by reference.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn detect_text(&self, image_key: &str) -> Result<Vec<TextLine>, RecognitionError>;
}
