//! Attachment upload.
//!
//! Files are uploaded on their own and the returned descriptor is placed in
//! a later grievance submission; nothing links the two transactionally.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use grievance_core::file_safety::dotted_extension;
use grievance_core::screen_upload;
use grievance_db::object_key;

use crate::error::ApiError;
use crate::AppState;

/// Descriptor returned to the client. `name`/`url`/`size`/`type` match the
/// attachment shape accepted on submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedAttachment {
    pub name: String,
    pub url: String,
    pub size: i64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub key: String,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Multipart error: {}", e.body_text()))
    }
}

/// Upload one file (multipart field `file`).
#[utoipa::path(post, path = "/attachments", tag = "Attachments",
    responses(
        (status = 200, description = "Stored file descriptor", body = UploadedAttachment),
        (status = 400, description = "Missing file"),
        (status = 413, description = "File too large"),
        (status = 415, description = "File type not allowed"),
        (status = 503, description = "Attachment storage not configured")
    ))]
pub async fn upload_attachment(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadedAttachment>, ApiError> {
    let store = state.object_store.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Attachment storage not configured".to_string())
    })?;

    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let claimed = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?.to_vec();
        upload = Some((filename, claimed, data));
        break;
    }
    let (filename, claimed, data) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    let screened = screen_upload(
        &filename,
        &data,
        claimed.as_deref(),
        state.config.upload_max_bytes,
        &state.config.upload_allowed_types,
    )?;

    let key = object_key(&dotted_extension(&screened.filename));
    let size = data.len() as i64;
    let url = store.put(&key, data, &screened.content_type).await?;

    info!(
        subsystem = "api",
        op = "upload",
        object_size = size,
        content_type = %screened.content_type,
        key = %key,
        "Attachment stored"
    );

    Ok(Json(UploadedAttachment {
        name: screened.filename,
        url,
        size,
        content_type: screened.content_type,
        key,
    }))
}
