//! HTTP error mapping.
//!
//! Every error body is `{"error": "<message>"}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use grievance_core::{Error, UploadRejection};

use crate::middleware::SyncDenied;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    UnsupportedMediaType(String),
    Unprocessable(String),
    TooManyRequests(String),
    Internal(String),
    BadGateway(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidId(msg) => ApiError::BadRequest(msg),
            Error::InvalidInput(msg) => ApiError::Unprocessable(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Inference(msg) => ApiError::BadGateway(format!("Categorization failed: {}", msg)),
            Error::Storage(msg) => ApiError::BadGateway(format!("Upload failed: {}", msg)),
            Error::Request(msg) => ApiError::BadGateway(format!("Upstream request failed: {}", msg)),
            Error::Config(msg) => ApiError::ServiceUnavailable(msg),
            Error::Database(db_err) => {
                let msg = db_err.to_string();
                tracing::error!(subsystem = "api", error = %msg, "Database error");
                ApiError::Internal(format!("Database error: {}", msg))
            }
            other => {
                tracing::error!(subsystem = "api", error = %other, "Unhandled service error");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<SyncDenied> for ApiError {
    fn from(denied: SyncDenied) -> Self {
        let msg = denied.message().to_string();
        match denied {
            SyncDenied::NotConfigured => ApiError::ServiceUnavailable(msg),
            SyncDenied::MissingToken => ApiError::Unauthorized(msg),
            SyncDenied::InvalidToken | SyncDenied::AddressNotAllowed => ApiError::Forbidden(msg),
        }
    }
}

impl From<UploadRejection> for ApiError {
    fn from(rejection: UploadRejection) -> Self {
        match rejection {
            UploadRejection::TooLarge { .. } => ApiError::PayloadTooLarge(rejection.message()),
            _ => ApiError::UnsupportedMediaType(rejection.message()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let msg = rejection.body_text();
        match rejection.status() {
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::UnsupportedMediaType(msg),
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(msg),
            StatusCode::UNPROCESSABLE_ENTITY => ApiError::Unprocessable(msg),
            _ => ApiError::BadRequest(msg),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m)
            | ApiError::PayloadTooLarge(m)
            | ApiError::UnsupportedMediaType(m)
            | ApiError::Unprocessable(m)
            | ApiError::TooManyRequests(m)
            | ApiError::Internal(m)
            | ApiError::BadGateway(m)
            | ApiError::ServiceUnavailable(m) => m,
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
