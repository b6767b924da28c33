//! Direct access to the categorization advisor.

use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use grievance_core::Categorization;

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategorizationRequest {
    pub details: String,
}

/// Suggest a category for grievance text without storing anything.
#[utoipa::path(post, path = "/grievances/categorize", tag = "Categorization",
    request_body = CategorizationRequest,
    responses(
        (status = 200, description = "Suggested category", body = Categorization),
        (status = 422, description = "Empty details"),
        (status = 502, description = "Advisor failed"),
        (status = 503, description = "Advisor not configured")
    ))]
pub async fn categorize(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CategorizationRequest>,
) -> Result<Json<Categorization>, ApiError> {
    if body.details.trim().is_empty() {
        return Err(ApiError::Unprocessable(
            "Grievance details cannot be empty".to_string(),
        ));
    }
    let advisor = state.advisor.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable(
            "Categorization service not configured. Set OPENAI_API_KEY.".to_string(),
        )
    })?;

    let timeout = Duration::from_secs(state.config.categorizer_timeout_secs);
    let result = tokio::time::timeout(timeout, advisor.categorize(&body.details))
        .await
        .map_err(|_| ApiError::BadGateway("Categorization timed out".to_string()))??;
    Ok(Json(result))
}
