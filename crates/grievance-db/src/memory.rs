//! In-memory grievance repository.
//!
//! Used when `STORAGE_BACKEND=memory` and by the API integration tests. Each
//! patch is applied under the write lock, so a record's field changes commit
//! together.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use grievance_core::{
    Error, Grievance, GrievancePatch, GrievanceRepository, PatchOutcome, Result,
};

#[derive(Default)]
pub struct InMemoryGrievanceRepository {
    records: RwLock<HashMap<String, Grievance>>,
}

impl InMemoryGrievanceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl GrievanceRepository for InMemoryGrievanceRepository {
    async fn insert(&self, grievance: &Grievance) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&grievance.id) {
            return Err(Error::duplicate_id(&grievance.id));
        }
        records.insert(grievance.id.clone(), grievance.clone());
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Option<Grievance>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn apply_patch(
        &self,
        id: &str,
        patch: &GrievancePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<PatchOutcome>> {
        let mut records = self.records.write().await;
        let Some(stored) = records.get_mut(id) else {
            return Ok(None);
        };
        let updated_fields = stored.apply_patch(patch, now);
        Ok(Some(PatchOutcome {
            grievance: stored.clone(),
            updated_fields,
        }))
    }

    async fn list_created_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Grievance>> {
        let records = self.records.read().await;
        let mut out: Vec<Grievance> = records
            .values()
            .filter(|g| g.created_at >= cutoff)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use grievance_core::{FieldUpdate, GrievanceIdGenerator, NewGrievance};

    fn record(created_at: DateTime<Utc>) -> Grievance {
        Grievance::create(
            GrievanceIdGenerator::default().new_id(),
            NewGrievance {
                is_anonymous: true,
                details: Some("road washed out".to_string()),
                ..Default::default()
            },
            created_at,
        )
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let repo = InMemoryGrievanceRepository::new();
        let g = record(Utc::now());
        repo.insert(&g).await.unwrap();
        assert_eq!(repo.fetch(&g.id).await.unwrap(), Some(g));
        assert!(repo.fetch("GRV-MISSING").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_apply_patch_missing_returns_none() {
        let repo = InMemoryGrievanceRepository::new();
        let outcome = repo
            .apply_patch("GRV-NOPE", &GrievancePatch::default(), Utc::now())
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_apply_patch_persists() {
        let repo = InMemoryGrievanceRepository::new();
        let g = record(Utc::now());
        repo.insert(&g).await.unwrap();

        let patch = GrievancePatch {
            external_status: Some(FieldUpdate::Set("in_progress".to_string())),
            ..Default::default()
        };
        let later = g.created_at + Duration::seconds(1);
        let outcome = repo.apply_patch(&g.id, &patch, later).await.unwrap().unwrap();
        assert_eq!(outcome.updated_fields, vec!["external_status"]);

        let stored = repo.fetch(&g.id).await.unwrap().unwrap();
        assert_eq!(stored.external_status.as_deref(), Some("in_progress"));
        assert_eq!(stored.updated_at, later);
    }

    #[tokio::test]
    async fn test_list_created_since_newest_first() {
        let repo = InMemoryGrievanceRepository::new();
        let now = Utc::now();
        let old = record(now - Duration::hours(30));
        let mid = record(now - Duration::hours(5));
        let new = record(now - Duration::minutes(1));
        for g in [&old, &mid, &new] {
            repo.insert(g).await.unwrap();
        }

        let recent = repo.list_created_since(now - Duration::hours(24)).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec![new.id.as_str(), mid.id.as_str()]);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_conflict() {
        let repo = InMemoryGrievanceRepository::new();
        let g = record(Utc::now());
        repo.insert(&g).await.unwrap();

        let err = repo.insert(&g).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(err.detail(), format!("Grievance {} already exists", g.id));
    }
}
