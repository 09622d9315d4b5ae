//! Data model for the verification pipeline.
//!
//! Field names serialize in the camelCase form the HTTP API exposes
//! (`verificationId`, `imageKey`, ...); `ProductMatch` keeps snake_case
//! fields because registry rows are persisted and returned in that shape.

use std::fmt;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Retention horizon applied to every verification record.
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

/// Which registry search field a term is entered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Search by registration number (preferred whenever one is present).
    RegistrationNumber,
    /// Search by product name (fallback when no number was extracted).
    ProductName,
}

impl SearchMode {
    /// Human-readable label used in messages and the persisted `searchType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::RegistrationNumber => "registration number",
            SearchMode::ProductName => "product name",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound verification request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    /// Base64-encoded image bytes, optionally carrying a data-URL prefix.
    #[serde(default)]
    pub image: Option<String>,
    /// Operator-supplied registration number; bypasses extraction entirely.
    #[serde(default)]
    pub registration_number: Option<String>,
}

/// Output of the extraction stage, and the matching stage's input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutput {
    pub verification_id: String,
    pub timestamp: String,
    pub image_key: String,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    /// Recognition confidence of the line the number came from, when the
    /// number was produced by pattern matching rather than operator input.
    #[serde(default)]
    pub ocr_confidence: Option<f64>,
    /// Full recognized text, concatenated across lines.
    #[serde(default)]
    pub extracted_text: Option<String>,
}

/// One registry row matched during a search, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub product_name: String,
    pub active_ingredients: String,
    pub product_category: String,
    /// The registry's own reference number for the product.
    pub nrn: String,
    pub status: String,
}

/// Structured verdict from the registry matching stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the matching attempt completed without malformed input.
    pub success: bool,
    /// Whether the registry contains at least one matching entry.
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<ProductMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set when the registry session failed and this verdict is a fallback,
    /// not a confirmed negative.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub registry_unreachable: bool,
}

impl ValidationResult {
    /// Verdict for a search that matched one or more registry rows.
    pub fn found(
        term: &str,
        mode: SearchMode,
        registration_number: Option<&str>,
        results: Vec<ProductMatch>,
    ) -> Self {
        Self {
            success: true,
            found: true,
            search_term: Some(term.to_string()),
            search_type: Some(mode.as_str().to_string()),
            registration_number: registration_number.map(str::to_string),
            results,
            message: None,
            registry_unreachable: false,
        }
    }

    /// Verdict for a search that completed but matched nothing.
    pub fn not_found(term: &str, mode: SearchMode, registration_number: Option<&str>) -> Self {
        Self {
            success: true,
            found: false,
            search_term: Some(term.to_string()),
            search_type: Some(mode.as_str().to_string()),
            registration_number: registration_number.map(str::to_string),
            results: Vec::new(),
            message: Some(format!("Product not found in registry (searched by {mode})")),
            registry_unreachable: false,
        }
    }

    /// Fallback verdict when the registry session itself failed. Explicitly
    /// distinguishable from a true negative via `registry_unreachable`.
    pub fn unreachable(
        term: &str,
        mode: SearchMode,
        registration_number: Option<&str>,
        reason: &str,
    ) -> Self {
        Self {
            success: true,
            found: false,
            search_term: Some(term.to_string()),
            search_type: Some(mode.as_str().to_string()),
            registration_number: registration_number.map(str::to_string),
            results: Vec::new(),
            message: Some(format!(
                "Registry could not be reached (searched by {mode}); not a confirmed negative: {reason}"
            )),
            registry_unreachable: true,
        }
    }

    /// Verdict when neither a registration number nor a product name was
    /// available to search with.
    pub fn nothing_to_search() -> Self {
        Self {
            success: false,
            found: false,
            search_term: None,
            search_type: None,
            registration_number: None,
            results: Vec::new(),
            message: Some("No registration number or product name provided".to_string()),
            registry_unreachable: false,
        }
    }
}

/// The durable artifact of one verification attempt. Written exactly once,
/// never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub verification_id: String,
    pub timestamp: String,
    pub image_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    pub validation_result: ValidationResult,
    /// Unix epoch seconds after which the storage layer may purge the record.
    pub expires_at: i64,
}

/// Final pipeline response returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub verification_id: String,
    pub timestamp: String,
    pub image_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    pub validation_result: ValidationResult,
}

/// Generate a fresh verification identifier.
pub fn new_verification_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current instant as a sortable ISO-8601 UTC string with microsecond
/// precision. Doubles as the secondary-index sort key.
pub fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Deterministic blob key for a stored image.
pub fn image_key(timestamp: &str, verification_id: &str) -> String {
    format!("images/{timestamp}_{verification_id}.jpg")
}

/// Absolute retention deadline, `days` from now, as epoch seconds.
pub fn retention_deadline(days: i64) -> i64 {
    (Utc::now() + Duration::days(days)).timestamp()
}
