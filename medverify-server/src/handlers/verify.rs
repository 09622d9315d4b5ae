//! Full verification handler
//!
//! Handles POST /verify requests: extraction followed by registry matching,
//! returning the persisted-record-equivalent response.

use axum::{extract::State, Json};
use medverify_core::{VerificationRequest, VerificationResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// Verify a pharmaceutical product photo
///
/// Accepts a JSON body with:
/// - **image**: base64-encoded packaging photo (data-URL prefix tolerated)
/// - **registrationNumber** (optional): operator-supplied number that
///   bypasses extraction
///
/// Runs the extraction and registry matching stages in sequence and returns
/// the verification id, image key and the structured registry verdict. The
/// verdict is durably recorded before the response is returned.
#[utoipa::path(
    post,
    path = "/verify",
    tag = "Verification",
    responses(
        (status = 200, description = "Verification completed with a structured verdict"),
        (status = 400, description = "Missing or undecodable image and no registration number"),
        (status = 502, description = "A downstream stage could not be completed")
    )
)]
pub async fn verify_handler(
    State(state): State<AppState>,
    Json(request): Json<VerificationRequest>,
) -> Result<Json<VerificationResponse>, ApiError> {
    let response = state.orchestrator.verify(&request).await?;
    Ok(Json(response))
}
