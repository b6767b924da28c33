//! Structured logging field names shared by every grievance crate.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Primary write failed, requires operator attention |
//! | WARN  | Advisory step failed, fallback applied (categorization, notification) |
//! | INFO  | Lifecycle events, record created/updated, sync accepted |
//! | DEBUG | Decision points (auto-categorize or not, household lookup hit/miss) |
//! | TRACE | Per-item detail (attachment coercion, batch item results) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "intake", "sync"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "normalizer", "categorizer", "batch", "gatekeeper", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create", "update_status", "apply_batch", "sync_status"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Grievance identifier being operated on.
pub const GRIEVANCE_ID: &str = "grievance_id";

/// Household identifier used for location lookup.
pub const HOUSEHOLD_ID: &str = "hh_id";

/// Peer address of an external sync caller.
pub const PEER_ADDR: &str = "peer_addr";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of items in a batch request.
pub const BATCH_SIZE: &str = "batch_size";

/// Number of records returned by an export.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of an uploaded object.
pub const OBJECT_SIZE: &str = "object_size";

/// Byte length of a prompt or response.
pub const PROMPT_LEN: &str = "prompt_len";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether the operation succeeded.
pub const SUCCESS: &str = "success";

/// Error message (on failure).
pub const ERROR: &str = "error";

/// Model name used for categorization.
pub const MODEL: &str = "model";
