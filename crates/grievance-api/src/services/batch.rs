//! Batch update coordinator.
//!
//! Identifier format is checked for every item before any write; one bad id
//! rejects the whole request. After that, items are applied strictly in
//! request order, each in its own commit, and a failing item only fails its
//! own result.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use grievance_core::{BatchItemResult, Error, GrievanceIdGenerator, Result};
use grievance_db::GrievanceStore;

use crate::services::updates::BatchUpdateItem;

pub struct BatchUpdateCoordinator<'a> {
    store: &'a GrievanceStore,
    ids: &'a GrievanceIdGenerator,
}

impl<'a> BatchUpdateCoordinator<'a> {
    pub fn new(store: &'a GrievanceStore, ids: &'a GrievanceIdGenerator) -> Self {
        Self { store, ids }
    }

    /// Reject the request if any item carries a malformed id.
    pub fn validate(&self, items: &[BatchUpdateItem]) -> Result<()> {
        match items.iter().find(|item| !self.ids.is_valid(&item.id)) {
            Some(item) => Err(Error::InvalidInput(format!(
                "Invalid grievance ID format: {}",
                item.id
            ))),
            None => Ok(()),
        }
    }

    /// Apply every item and return one result per item, in input order.
    pub async fn apply(&self, items: &[BatchUpdateItem]) -> Result<Vec<BatchItemResult>> {
        self.validate(items)?;

        let start = Instant::now();
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let result = match self.store.update(&item.id, item.to_patch(), Utc::now()).await {
                Ok(outcome) => BatchItemResult::success(&item.id, outcome.updated_fields),
                Err(e) => {
                    debug!(
                        subsystem = "api",
                        component = "batch",
                        grievance_id = %item.id,
                        error = %e,
                        "Batch item failed"
                    );
                    BatchItemResult::failure(&item.id, e.detail())
                }
            };
            results.push(result);
        }

        let failed = results.iter().filter(|r| !r.ok).count();
        info!(
            subsystem = "api",
            component = "batch",
            op = "status_batch",
            batch_size = items.len(),
            failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch update applied"
        );
        Ok(results)
    }
}
