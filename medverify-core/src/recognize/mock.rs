//! Mock recognizers for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{RecognitionError, TextLine, TextRecognizer};

/// Recognizer returning a canned set of lines and counting invocations.
#[derive(Debug, Default)]
pub struct MockRecognizer {
    lines: Vec<TextLine>,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn new(lines: Vec<TextLine>) -> Self {
        Self {
            lines,
            calls: AtomicUsize::new(0),
        }
    }

    /// Recognizer that sees no text at all.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Convenience constructor from `(text, confidence)` pairs.
    pub fn with_lines(lines: &[(&str, f64)]) -> Self {
        Self::new(
            lines
                .iter()
                .map(|(text, confidence)| TextLine {
                    text: (*text).to_string(),
                    confidence: *confidence,
                })
                .collect(),
        )
    }

    /// Number of `detect_text` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    async fn detect_text(&self, _image_key: &str) -> Result<Vec<TextLine>, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lines.clone())
    }
}

/// Recognizer that always fails, for exercising degraded extraction.
#[derive(Debug, Default)]
pub struct FailingRecognizer {
    calls: AtomicUsize,
}

impl FailingRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRecognizer for FailingRecognizer {
    async fn detect_text(&self, _image_key: &str) -> Result<Vec<TextLine>, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RecognitionError::Service("mock recognizer failure".into()))
    }
}
