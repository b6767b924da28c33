//! Record store adapter: the single entry point for creating, reading and
//! mutating grievances.
//!
//! Wraps a `GrievanceRepository` and folds the household location lookup into
//! every update, so a patch that writes a non-empty `hh_id` also writes the
//! registered island/district/village in the same commit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use grievance_core::{
    Error, Grievance, GrievancePatch, GrievanceRepository, HouseholdDirectory, PatchOutcome,
    Result,
};

/// Message used for every missing-record error.
pub const NOT_FOUND_MESSAGE: &str = "Grievance not found";

#[derive(Clone)]
pub struct GrievanceStore {
    repo: Arc<dyn GrievanceRepository>,
    households: Arc<dyn HouseholdDirectory>,
}

impl GrievanceStore {
    pub fn new(repo: Arc<dyn GrievanceRepository>, households: Arc<dyn HouseholdDirectory>) -> Self {
        Self { repo, households }
    }

    pub async fn create(&self, grievance: Grievance) -> Result<Grievance> {
        self.repo.insert(&grievance).await?;
        Ok(grievance)
    }

    pub async fn get(&self, id: &str) -> Result<Grievance> {
        self.repo
            .fetch(id)
            .await?
            .ok_or_else(|| Error::NotFound(NOT_FOUND_MESSAGE.to_string()))
    }

    /// Apply `patch` to one record.
    ///
    /// A known household id overrides any location values already in the
    /// patch; an unknown one leaves location untouched.
    pub async fn update(
        &self,
        id: &str,
        mut patch: GrievancePatch,
        now: DateTime<Utc>,
    ) -> Result<PatchOutcome> {
        if let Some(hh_id) = patch.household_lookup_key().map(str::to_owned) {
            match self.households.lookup(&hh_id).await {
                Ok(Some(location)) => {
                    debug!(
                        subsystem = "db",
                        component = "store",
                        grievance_id = %id,
                        hh_id = %hh_id,
                        "Household location resolved"
                    );
                    patch.set_location(&location);
                }
                Ok(None) => {
                    debug!(
                        subsystem = "db",
                        component = "store",
                        grievance_id = %id,
                        hh_id = %hh_id,
                        "Household id not in registry, location unchanged"
                    );
                }
                Err(e) => {
                    warn!(
                        subsystem = "db",
                        component = "store",
                        grievance_id = %id,
                        hh_id = %hh_id,
                        error = %e,
                        "Household lookup failed, location unchanged"
                    );
                }
            }
        }

        self.repo
            .apply_patch(id, &patch, now)
            .await?
            .ok_or_else(|| Error::NotFound(NOT_FOUND_MESSAGE.to_string()))
    }

    /// Records created at or after `cutoff`, newest first.
    pub async fn created_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Grievance>> {
        self.repo.list_created_since(cutoff).await
    }
}
