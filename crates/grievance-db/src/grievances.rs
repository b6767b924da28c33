//! PostgreSQL grievance repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;

use grievance_core::{
    Attachment, Error, Grievance, GrievancePatch, GrievanceRepository, PatchOutcome, Result,
};

const COLUMNS: &str = "id, created_at, updated_at, is_anonymous,
    complainant_name, complainant_email, complainant_phone, complainant_gender,
    is_hh_registered, hh_id, hh_address, island, district, village,
    category_type, details, attachments,
    external_status, external_status_note, external_updated_at";

/// PostgreSQL implementation of GrievanceRepository.
#[derive(Clone)]
pub struct PgGrievanceRepository {
    pool: PgPool,
}

impl PgGrievanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_row(r: &PgRow) -> Result<Grievance> {
        let attachments: Option<Json<Vec<Attachment>>> =
            r.try_get("attachments").map_err(Error::Database)?;
        Ok(Grievance {
            id: r.get("id"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
            is_anonymous: r.get("is_anonymous"),
            complainant_name: r.get("complainant_name"),
            complainant_email: r.get("complainant_email"),
            complainant_phone: r.get("complainant_phone"),
            complainant_gender: r.get("complainant_gender"),
            is_hh_registered: r.get("is_hh_registered"),
            hh_id: r.get("hh_id"),
            hh_address: r.get("hh_address"),
            island: r.get("island"),
            district: r.get("district"),
            village: r.get("village"),
            category_type: r.get("category_type"),
            details: r.get("details"),
            attachments: attachments.map(|j| j.0),
            external_status: r.get("external_status"),
            external_status_note: r.get("external_status_note"),
            external_updated_at: r.get("external_updated_at"),
        })
    }

    async fn fetch_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: &str,
    ) -> Result<Option<Grievance>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM grievance WHERE id = $1 FOR UPDATE",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;
        row.as_ref().map(Self::parse_row).transpose()
    }
}

#[async_trait]
impl GrievanceRepository for PgGrievanceRepository {
    async fn insert(&self, g: &Grievance) -> Result<()> {
        sqlx::query(
            "INSERT INTO grievance (id, created_at, updated_at, is_anonymous,
                complainant_name, complainant_email, complainant_phone, complainant_gender,
                is_hh_registered, hh_id, hh_address, island, district, village,
                category_type, details, attachments,
                external_status, external_status_note, external_updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                     $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
        )
        .bind(&g.id)
        .bind(g.created_at)
        .bind(g.updated_at)
        .bind(g.is_anonymous)
        .bind(&g.complainant_name)
        .bind(&g.complainant_email)
        .bind(&g.complainant_phone)
        .bind(&g.complainant_gender)
        .bind(g.is_hh_registered)
        .bind(&g.hh_id)
        .bind(&g.hh_address)
        .bind(&g.island)
        .bind(&g.district)
        .bind(&g.village)
        .bind(&g.category_type)
        .bind(&g.details)
        .bind(g.attachments.as_ref().map(Json))
        .bind(&g.external_status)
        .bind(&g.external_status_note)
        .bind(g.external_updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => Error::duplicate_id(&g.id),
            _ => Error::Database(e),
        })?;

        debug!(subsystem = "db", component = "grievances", op = "insert", grievance_id = %g.id, "Inserted grievance");
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Option<Grievance>> {
        let row = sqlx::query(&format!("SELECT {} FROM grievance WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.as_ref().map(Self::parse_row).transpose()
    }

    async fn apply_patch(
        &self,
        id: &str,
        patch: &GrievancePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<PatchOutcome>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let Some(mut grievance) = Self::fetch_for_update(&mut tx, id).await? else {
            tx.rollback().await.map_err(Error::Database)?;
            return Ok(None);
        };

        let updated_fields = grievance.apply_patch(patch, now);

        sqlx::query(
            "UPDATE grievance SET
                updated_at = $2,
                external_status = $3,
                external_status_note = $4,
                external_updated_at = $5,
                category_type = $6,
                hh_id = $7,
                island = $8,
                district = $9,
                village = $10
             WHERE id = $1",
        )
        .bind(&grievance.id)
        .bind(grievance.updated_at)
        .bind(&grievance.external_status)
        .bind(&grievance.external_status_note)
        .bind(grievance.external_updated_at)
        .bind(&grievance.category_type)
        .bind(&grievance.hh_id)
        .bind(&grievance.island)
        .bind(&grievance.district)
        .bind(&grievance.village)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        Ok(Some(PatchOutcome {
            grievance,
            updated_fields,
        }))
    }

    async fn list_created_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Grievance>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM grievance WHERE created_at >= $1 ORDER BY created_at DESC, id DESC",
            COLUMNS
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        rows.iter().map(Self::parse_row).collect()
    }
}
