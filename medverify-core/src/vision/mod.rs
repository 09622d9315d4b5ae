//! AI-assisted product naming.
//!
//! Fallback path for packaging with no recognizable registration number: a
//! vision-capable model is asked for the bare product name, with the full
//! recognized text (when any) as disambiguating context.

mod http;
mod mock;

pub use http::{HttpProductNamer, VisionConfig};
pub use mock::{FailingNamer, MockNamer};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NamerError {
    #[error("vision model request failed: {0}")]
    Service(String),

    #[error("vision model request timed out after {0}s")]
    Timeout(u64),

    #[error("unexpected vision model response: {0}")]
    Parse(String),

    #[error("namer configuration error: {0}")]
    Configuration(String),
}

/// Vision-capable model asked for the bare product name on the packaging.
#[async_trait]
pub trait ProductNamer: Send + Sync {
    async fn name_product(
        &self,
        image: &[u8],
        text_context: Option<&str>,
    ) -> Result<String, NamerError>;
}

/// Post-process a raw model reply into a product name: trim, strip
/// surrounding quotes, keep only the first line. Returns `None` when nothing
/// usable remains.
pub fn clean_name(raw: &str) -> Option<String> {
    let name = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .lines()
        .next()?
        .trim()
        .to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
