//! Extraction stage handler
//!
//! Handles POST /process-image requests: stores the image and extracts a
//! registration number or product name, without registry matching.

use axum::{extract::State, Json};
use medverify_core::{ExtractionOutput, VerificationRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// Run the extraction stage alone
///
/// Stores the image and returns the extraction result: the registration
/// number (pattern-matched from recognized text, or the operator-supplied
/// one) or a best-effort product name, plus the recognized text and
/// confidence. Useful for clients that stage their own validation call.
#[utoipa::path(
    post,
    path = "/process-image",
    tag = "Verification",
    responses(
        (status = 200, description = "Image stored and extraction completed"),
        (status = 400, description = "Missing or undecodable image"),
        (status = 502, description = "Image storage unavailable")
    )
)]
pub async fn process_image_handler(
    State(state): State<AppState>,
    Json(request): Json<VerificationRequest>,
) -> Result<Json<ExtractionOutput>, ApiError> {
    let output = state.extraction.process(&request).await?;
    Ok(Json(output))
}
