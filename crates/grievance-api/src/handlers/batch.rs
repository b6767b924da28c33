//! Batch status updates.

use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::services::updates::{BatchUpdateRequest, BatchUpdateResponse};
use crate::services::BatchUpdateCoordinator;
use crate::AppState;

/// Apply many partial updates in one call.
///
/// A malformed id anywhere rejects the whole request with 422. Otherwise
/// every item gets its own result, in request order.
#[utoipa::path(put, path = "/grievances/status-batch", tag = "Grievances",
    request_body = BatchUpdateRequest,
    responses(
        (status = 200, description = "Per-item results", body = BatchUpdateResponse),
        (status = 422, description = "Malformed id or body")
    ))]
pub async fn update_status_batch(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<BatchUpdateRequest>,
) -> Result<Json<BatchUpdateResponse>, ApiError> {
    let results = BatchUpdateCoordinator::new(&state.store, &state.ids)
        .apply(&body.updates)
        .await?;
    Ok(Json(BatchUpdateResponse { results }))
}
