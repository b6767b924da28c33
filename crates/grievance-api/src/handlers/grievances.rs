//! Grievance record handlers: create, fetch, export, single update, receipt.

use axum::extract::{Path, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use grievance_core::defaults::{EXPORT_MAX_HOURS, EXPORT_MIN_HOURS, EXPORT_SINCE_HOURS};
use grievance_core::{Error, Grievance, GrievanceSubmission};

use crate::error::ApiError;
use crate::extract::{JsonBody, QueryParams};
use crate::services::intake;
use crate::services::receipt::render_receipt;
use crate::services::updates::StatusUpdateRequest;
use crate::AppState;

/// Response header echoing the assigned id.
pub const GRIEVANCE_ID_HEADER: HeaderName = HeaderName::from_static("x-grievance-id");

/// Submit a grievance.
///
/// Accepts the canonical fields plus the `grievance_details` alias and
/// `attachments` as a list, a single object, or JSON text. Any `id` in the
/// body is ignored.
#[utoipa::path(post, path = "/grievances", tag = "Grievances",
    responses(
        (status = 201, description = "Stored grievance", body = Grievance,
            headers(("x-grievance-id" = String, description = "Assigned grievance id"))),
        (status = 422, description = "Validation failed")
    ))]
pub async fn create_grievance(
    State(state): State<AppState>,
    JsonBody(submission): JsonBody<GrievanceSubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let grievance = intake::submit(&state, submission).await?;
    let id_header = HeaderValue::from_str(&grievance.id)
        .map_err(|e| ApiError::Internal(format!("Invalid id header: {}", e)))?;
    Ok((
        StatusCode::CREATED,
        [(GRIEVANCE_ID_HEADER, id_header)],
        Json(grievance),
    ))
}

/// Fetch one grievance. Any string is looked up; only existence matters.
#[utoipa::path(get, path = "/grievances/{id}", tag = "Grievances",
    params(("id" = String, Path, description = "Grievance id")),
    responses(
        (status = 200, description = "Grievance", body = Grievance),
        (status = 404, description = "Grievance not found")
    ))]
pub async fn get_grievance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Grievance>, ApiError> {
    Ok(Json(state.store.get(&id).await?))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportQuery {
    /// Window size in hours, 1 to 168 (default 24).
    pub since_hours: Option<i64>,
}

/// Grievances created within the last `since_hours`, newest first.
#[utoipa::path(get, path = "/grievances/export", tag = "Grievances",
    params(ExportQuery),
    responses(
        (status = 200, description = "Recent grievances", body = [Grievance]),
        (status = 422, description = "Window out of range")
    ))]
pub async fn export_grievances(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ExportQuery>,
) -> Result<Json<Vec<Grievance>>, ApiError> {
    let hours = query.since_hours.unwrap_or(EXPORT_SINCE_HOURS);
    if !(EXPORT_MIN_HOURS..=EXPORT_MAX_HOURS).contains(&hours) {
        return Err(ApiError::Unprocessable(format!(
            "since_hours must be between {} and {}",
            EXPORT_MIN_HOURS, EXPORT_MAX_HOURS
        )));
    }

    let cutoff = Utc::now() - Duration::hours(hours);
    let rows = state.store.created_since(cutoff).await?;
    info!(
        subsystem = "api",
        op = "export",
        since_hours = hours,
        result_count = rows.len(),
        "Export served"
    );
    Ok(Json(rows))
}

/// Update status, note, timestamp, category or household id of one grievance.
#[utoipa::path(put, path = "/grievances/{id}/status", tag = "Grievances",
    params(("id" = String, Path, description = "Grievance id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Updated grievance", body = Grievance),
        (status = 400, description = "Malformed grievance id"),
        (status = 404, description = "Grievance not found"),
        (status = 422, description = "Invalid body")
    ))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StatusUpdateRequest>,
) -> Result<Json<Grievance>, ApiError> {
    if !state.ids.is_valid(&id) {
        return Err(Error::InvalidId(format!("Invalid grievance ID format: {}", id)).into());
    }

    let outcome = state.store.update(&id, body.to_patch(), Utc::now()).await?;
    info!(
        subsystem = "api",
        op = "update_status",
        grievance_id = %id,
        updated_fields = ?outcome.updated_fields,
        "Grievance updated"
    );
    Ok(Json(outcome.grievance))
}

/// PDF receipt for one grievance.
#[utoipa::path(get, path = "/grievances/{id}/receipt.pdf", tag = "Grievances",
    params(("id" = String, Path, description = "Grievance id")),
    responses(
        (status = 200, description = "PDF receipt", content_type = "application/pdf"),
        (status = 404, description = "Grievance not found")
    ))]
pub async fn receipt_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let grievance = state.store.get(&id).await?;
    let pdf = render_receipt(&grievance)?;
    let disposition = HeaderValue::from_str(&format!("inline; filename=receipt-{}.pdf", grievance.id))
        .map_err(|e| ApiError::Internal(format!("Invalid header: {}", e)))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}
