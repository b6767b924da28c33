//! External case-management status push. Authentication is done by the
//! `require_sync_auth` route layer before this handler runs.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use tracing::info;

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::services::updates::{SyncStatusRequest, SyncStatusResponse};
use crate::AppState;

/// Mirror the external case status onto a grievance. `status` is stored
/// exactly as sent, an empty string included.
#[utoipa::path(put, path = "/sync/{id}/status", tag = "Sync",
    params(("id" = String, Path, description = "Grievance id")),
    request_body = SyncStatusRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Status stored", body = SyncStatusResponse),
        (status = 401, description = "Missing Bearer token"),
        (status = 403, description = "Invalid token or IP not allowed"),
        (status = 404, description = "Grievance not found"),
        (status = 503, description = "Sync token not configured")
    ))]
pub async fn push_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<SyncStatusRequest>,
) -> Result<Json<SyncStatusResponse>, ApiError> {
    let now = Utc::now();
    let outcome = state.store.update(&id, body.to_patch(now), now).await?;
    info!(
        subsystem = "api",
        op = "sync_status",
        grievance_id = %id,
        status = outcome.grievance.external_status.as_deref().unwrap_or(""),
        "External status synced"
    );
    Ok(Json(SyncStatusResponse {
        ok: true,
        id,
        status: outcome.grievance.external_status,
    }))
}
