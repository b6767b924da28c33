//! Centralized default constants for the grievance service.
//!
//! Organized by domain area. Runtime configuration (`AppConfig` in the API
//! crate) falls back to these values when the environment is silent.

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Prefix prepended to every generated grievance id.
pub const ID_PREFIX: &str = "GRV-";

/// Length of the Crockford base32 ULID body following the prefix.
pub const ULID_LEN: usize = 26;

// =============================================================================
// INTAKE
// =============================================================================

/// Maximum characters of `details` after trimming.
pub const DETAILS_MAX_CHARS: usize = 10_000;

/// Whether a submission is anonymous when the flag is omitted.
pub const ANONYMOUS_BY_DEFAULT: bool = true;

// =============================================================================
// EXPORT
// =============================================================================

/// Default export window in hours.
pub const EXPORT_SINCE_HOURS: i64 = 24;

/// Smallest accepted export window in hours.
pub const EXPORT_MIN_HOURS: i64 = 1;

/// Largest accepted export window in hours (one week).
pub const EXPORT_MAX_HOURS: i64 = 168;

// =============================================================================
// UPLOADS
// =============================================================================

/// Maximum attachment size in bytes (10 MiB).
pub const UPLOAD_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Content types accepted for attachments when not overridden.
pub const UPLOAD_ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "text/plain",
    "audio/mpeg",
    "audio/ogg",
    "audio/wav",
    "video/mp4",
];

/// Default bucket for the HTTP object store.
pub const OBJECT_STORE_BUCKET: &str = "grievance-bucket";

/// Default endpoint for the HTTP object store.
pub const OBJECT_STORE_ENDPOINT: &str = "http://minio:9000";

// =============================================================================
// CATEGORIZATION
// =============================================================================

/// Default chat model for the categorization advisor.
pub const CATEGORIZER_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature for categorization prompts.
pub const CATEGORIZER_TEMPERATURE: f32 = 0.3;

/// Upper bound on the advisor call during creation, in seconds.
pub const CATEGORIZER_TIMEOUT_SECS: u64 = 20;

/// Default OpenAI-compatible API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// =============================================================================
// NOTIFICATION
// =============================================================================

/// Sender address for confirmation messages.
pub const NOTIFY_FROM: &str = "noreply@grievance.local";

/// Timeout for outbound mail relay requests, in seconds.
pub const NOTIFY_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8000;

/// Default rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Default maximum pooled database connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;
