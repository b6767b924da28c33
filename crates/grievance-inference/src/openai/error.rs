//! OpenAI-specific error handling.

use grievance_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    AuthenticationError,
    RateLimitExceeded,
    ModelNotFound,
    ServerError,
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Convert an upstream failure into `Error::Inference` with a readable prefix.
pub fn to_service_error(code: OpenAIErrorCode, message: &str) -> Error {
    let prefix = match code {
        OpenAIErrorCode::AuthenticationError => "Authentication failed",
        OpenAIErrorCode::RateLimitExceeded => "Rate limit exceeded",
        OpenAIErrorCode::ModelNotFound => "Model not found",
        OpenAIErrorCode::ServerError => "Server error",
        OpenAIErrorCode::Unknown => return Error::Inference(message.to_string()),
    };
    Error::Inference(format!("{}: {}", prefix, message))
}
