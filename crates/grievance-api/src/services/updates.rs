//! Request bodies for the three update paths and their mapping onto
//! `GrievancePatch`.
//!
//! Internal paths (single and batch): a key that is absent or `null` leaves
//! the field alone, `""` clears it. Sync path: `status` is written exactly as
//! sent, `note` follows the internal rule, and a timestamp that is missing or
//! unparseable (including non-string JSON other than epoch seconds) becomes now.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use grievance_core::{parse_timestamp_or, FieldUpdate, GrievancePatch, TimestampInput};

fn text(value: &Option<String>) -> Option<FieldUpdate<String>> {
    value.clone().map(FieldUpdate::from_text)
}

fn timestamp(value: &Option<TimestampInput>) -> Option<FieldUpdate<DateTime<Utc>>> {
    value.map(|t| match t {
        TimestampInput::At(at) => FieldUpdate::Set(at),
        TimestampInput::Clear => FieldUpdate::Clear,
    })
}

/// Body of `PUT /grievances/{id}/status`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub external_status: Option<String>,
    #[serde(default)]
    pub external_status_note: Option<String>,
    /// Any supported timestamp format; `""` clears.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub external_updated_at: Option<TimestampInput>,
    #[serde(default)]
    pub category_type: Option<String>,
    /// A known household id also rewrites island/district/village.
    #[serde(default)]
    pub hh_id: Option<String>,
}

impl StatusUpdateRequest {
    pub fn to_patch(&self) -> GrievancePatch {
        GrievancePatch {
            external_status: text(&self.external_status),
            external_status_note: text(&self.external_status_note),
            external_updated_at: timestamp(&self.external_updated_at),
            category_type: text(&self.category_type),
            hh_id: text(&self.hh_id),
            ..Default::default()
        }
    }
}

/// One item of `PUT /grievances/status-batch`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BatchUpdateItem {
    #[serde(alias = "gid")]
    pub id: String,
    #[serde(default)]
    pub external_status: Option<String>,
    #[serde(default)]
    pub external_status_note: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub external_updated_at: Option<TimestampInput>,
    #[serde(default)]
    pub category_type: Option<String>,
    #[serde(default)]
    pub hh_id: Option<String>,
    #[serde(default)]
    pub island: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
}

impl BatchUpdateItem {
    pub fn to_patch(&self) -> GrievancePatch {
        GrievancePatch {
            external_status: text(&self.external_status),
            external_status_note: text(&self.external_status_note),
            external_updated_at: timestamp(&self.external_updated_at),
            category_type: text(&self.category_type),
            hh_id: text(&self.hh_id),
            island: text(&self.island),
            district: text(&self.district),
            village: text(&self.village),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BatchUpdateRequest {
    pub updates: Vec<BatchUpdateItem>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchUpdateResponse {
    pub results: Vec<grievance_core::BatchItemResult>,
}

/// Body of `PUT /sync/{id}/status`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SyncStatusRequest {
    #[serde(alias = "external_status")]
    pub status: String,
    #[serde(default, alias = "external_status_note")]
    pub note: Option<String>,
    /// Timestamp string or Unix epoch seconds. Anything else means "now".
    #[serde(default, alias = "external_updated_at")]
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<serde_json::Value>,
}

impl SyncStatusRequest {
    pub fn to_patch(&self, now: DateTime<Utc>) -> GrievancePatch {
        GrievancePatch {
            external_status: Some(FieldUpdate::Set(self.status.clone())),
            external_status_note: text(&self.note),
            external_updated_at: Some(FieldUpdate::Set(parse_timestamp_or(
                self.updated_at.as_ref(),
                now,
            ))),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SyncStatusResponse {
    pub ok: bool,
    pub id: String,
    pub status: Option<String>,
}
