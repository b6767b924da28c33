//! Core traits for the grievance service.
//!
//! Storage, household registry, categorization, notification and object
//! hosting are collaborators behind these traits so the API crate can be
//! wired against PostgreSQL or memory, real or mock upstreams.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Grievance, GrievancePatch, HouseholdLocation};
use crate::taxonomy::Categorization;

// =============================================================================
// RECORD STORAGE
// =============================================================================

/// A patch that was committed, with the names of the fields it wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub grievance: Grievance,
    pub updated_fields: Vec<&'static str>,
}

/// Keyed-by-id grievance storage.
///
/// `apply_patch` must commit all field changes for one record atomically and
/// return `Ok(None)` when the id does not exist.
#[async_trait]
pub trait GrievanceRepository: Send + Sync {
    /// Insert a new record. Fails if the id already exists.
    async fn insert(&self, grievance: &Grievance) -> Result<()>;

    /// Fetch a record by id.
    async fn fetch(&self, id: &str) -> Result<Option<Grievance>>;

    /// Apply a partial update and refresh `updated_at` to `now`.
    async fn apply_patch(
        &self,
        id: &str,
        patch: &GrievancePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<PatchOutcome>>;

    /// Records created at or after `cutoff`, newest first.
    async fn list_created_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Grievance>>;
}

// =============================================================================
// HOUSEHOLD REGISTRY
// =============================================================================

/// Resolves a household id to its registered location.
#[async_trait]
pub trait HouseholdDirectory: Send + Sync {
    async fn lookup(&self, hh_id: &str) -> Result<Option<HouseholdLocation>>;
}

// =============================================================================
// INFERENCE
// =============================================================================

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Classifies grievance narrative text into the taxonomy.
#[async_trait]
pub trait CategorizationAdvisor: Send + Sync {
    /// `details` must be non-empty. Upstream failures are errors; output the
    /// model got wrong is coerced into the taxonomy instead.
    async fn categorize(&self, details: &str) -> Result<Categorization>;
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// A plain-text message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers outbound messages (confirmation e-mails).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<()>;
}

/// Hosts uploaded attachment bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key` and return a URL clients can fetch it from.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String>;
}
