//! Matching stage handler
//!
//! Handles POST /validate requests: registry matching and durable recording
//! for an already-extracted result.

use axum::{extract::State, Json};
use medverify_core::{ExtractionOutput, VerificationResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// Run the registry matching stage alone
///
/// Accepts an extraction result (`verificationId`, `timestamp`, `imageKey`,
/// optional `registrationNumber`/`productName`), searches the registry
/// number-first, persists the verification record and returns the verdict.
/// Registry outages yield a `registryUnreachable` verdict rather than an
/// error.
#[utoipa::path(
    post,
    path = "/validate",
    tag = "Verification",
    responses(
        (status = 200, description = "Matching completed and record persisted"),
        (status = 400, description = "Missing verification id or timestamp"),
        (status = 502, description = "Record store unavailable")
    )
)]
pub async fn validate_handler(
    State(state): State<AppState>,
    Json(input): Json<ExtractionOutput>,
) -> Result<Json<VerificationResponse>, ApiError> {
    let response = state.matching.validate(&input).await?;
    Ok(Json(response))
}
