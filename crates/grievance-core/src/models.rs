//! Core data models for the grievance service.
//!
//! `Grievance` is the sole persistent entity. Mutations after creation go
//! through `GrievancePatch`, whose per-field `FieldUpdate` distinguishes
//! "write this value" from "clear this field"; a field left as `None` in the
//! patch is not touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// RECORD TYPES
// =============================================================================

/// Reference to an uploaded file, carried on a grievance.
///
/// Every sub-field is independently optional on input and defaults to an
/// empty value, so a partially filled descriptor is still well-formed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Attachment {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub size: i64,
    #[serde(rename = "type", default)]
    pub content_type: String,
}

/// A stored grievance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Grievance {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_anonymous: bool,

    pub complainant_name: Option<String>,
    pub complainant_email: Option<String>,
    pub complainant_phone: Option<String>,
    pub complainant_gender: Option<String>,

    pub is_hh_registered: Option<bool>,
    pub hh_id: Option<String>,
    pub hh_address: Option<String>,

    pub island: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,

    pub category_type: Option<String>,
    pub details: Option<String>,
    pub attachments: Option<Vec<Attachment>>,

    pub external_status: Option<String>,
    pub external_status_note: Option<String>,
    pub external_updated_at: Option<DateTime<Utc>>,
}

/// Canonical, already-normalized fields for a new record.
///
/// Produced by the input normalizer; has no id or timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewGrievance {
    pub is_anonymous: bool,
    pub complainant_name: Option<String>,
    pub complainant_email: Option<String>,
    pub complainant_phone: Option<String>,
    pub complainant_gender: Option<String>,
    pub is_hh_registered: Option<bool>,
    pub hh_id: Option<String>,
    pub hh_address: Option<String>,
    pub island: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub category_type: Option<String>,
    pub details: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
}

impl Grievance {
    /// Materialize a new record with a server-assigned id.
    pub fn create(id: String, new: NewGrievance, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: now,
            updated_at: now,
            is_anonymous: new.is_anonymous,
            complainant_name: new.complainant_name,
            complainant_email: new.complainant_email,
            complainant_phone: new.complainant_phone,
            complainant_gender: new.complainant_gender,
            is_hh_registered: new.is_hh_registered,
            hh_id: new.hh_id,
            hh_address: new.hh_address,
            island: new.island,
            district: new.district,
            village: new.village,
            category_type: new.category_type,
            details: new.details,
            attachments: new.attachments,
            external_status: None,
            external_status_note: None,
            external_updated_at: None,
        }
    }

    /// Apply `patch` in place and refresh `updated_at` to `now`.
    ///
    /// Returns the names of the fields written, in canonical order.
    pub fn apply_patch(&mut self, patch: &GrievancePatch, now: DateTime<Utc>) -> Vec<&'static str> {
        let mut written = Vec::new();

        write_field(&mut self.external_status, &patch.external_status, "external_status", &mut written);
        write_field(
            &mut self.external_status_note,
            &patch.external_status_note,
            "external_status_note",
            &mut written,
        );
        write_field(
            &mut self.external_updated_at,
            &patch.external_updated_at,
            "external_updated_at",
            &mut written,
        );
        write_field(&mut self.category_type, &patch.category_type, "category_type", &mut written);
        write_field(&mut self.hh_id, &patch.hh_id, "hh_id", &mut written);
        write_field(&mut self.island, &patch.island, "island", &mut written);
        write_field(&mut self.district, &patch.district, "district", &mut written);
        write_field(&mut self.village, &patch.village, "village", &mut written);

        self.updated_at = now;
        written
    }
}

fn write_field<T: Clone>(
    slot: &mut Option<T>,
    update: &Option<FieldUpdate<T>>,
    name: &'static str,
    written: &mut Vec<&'static str>,
) {
    if let Some(update) = update {
        *slot = update.clone().into_option();
        written.push(name);
    }
}

// =============================================================================
// PATCH TYPES
// =============================================================================

/// Explicit write to one field: a new value, or an explicit clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Set(T),
    Clear,
}

impl<T> FieldUpdate<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            FieldUpdate::Set(v) => Some(v),
            FieldUpdate::Clear => None,
        }
    }
}

impl FieldUpdate<String> {
    /// Map raw update text: empty or whitespace-only clears, anything else is written as given.
    pub fn from_text(raw: String) -> Self {
        if raw.trim().is_empty() {
            FieldUpdate::Clear
        } else {
            FieldUpdate::Set(raw)
        }
    }
}

/// Partial update for one grievance. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrievancePatch {
    pub external_status: Option<FieldUpdate<String>>,
    pub external_status_note: Option<FieldUpdate<String>>,
    pub external_updated_at: Option<FieldUpdate<DateTime<Utc>>>,
    pub category_type: Option<FieldUpdate<String>>,
    pub hh_id: Option<FieldUpdate<String>>,
    pub island: Option<FieldUpdate<String>>,
    pub district: Option<FieldUpdate<String>>,
    pub village: Option<FieldUpdate<String>>,
}

impl GrievancePatch {
    pub fn is_empty(&self) -> bool {
        self == &GrievancePatch::default()
    }

    /// Household id this patch writes, if it writes a non-empty one.
    pub fn household_lookup_key(&self) -> Option<&str> {
        match &self.hh_id {
            Some(FieldUpdate::Set(id)) if !id.trim().is_empty() => Some(id.as_str()),
            _ => None,
        }
    }

    /// Overwrite the location group with a resolved household location.
    pub fn set_location(&mut self, location: &HouseholdLocation) {
        self.island = Some(FieldUpdate::Set(location.island.clone()));
        self.district = Some(FieldUpdate::Set(location.district.clone()));
        self.village = Some(FieldUpdate::Set(location.village.clone()));
    }
}

/// Location registered for a household in the external registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdLocation {
    pub island: String,
    pub district: String,
    pub village: String,
}

/// Outcome of one item in a batch update, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchItemResult {
    pub id: String,
    pub ok: bool,
    pub updated_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    pub fn success(id: impl Into<String>, fields: Vec<&'static str>) -> Self {
        Self {
            id: id.into(),
            ok: true,
            updated_fields: fields.into_iter().map(String::from).collect(),
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: false,
            updated_fields: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Grievance {
        let now = Utc::now();
        Grievance::create(
            "GRV-01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            NewGrievance {
                is_anonymous: true,
                details: Some("water pump broken".to_string()),
                island: Some("Tarawa".to_string()),
                ..Default::default()
            },
            now,
        )
    }

    #[test]
    fn test_create_sets_timestamps_and_leaves_sync_fields_empty() {
        let g = sample();
        assert_eq!(g.created_at, g.updated_at);
        assert!(g.external_status.is_none());
        assert!(g.external_status_note.is_none());
        assert!(g.external_updated_at.is_none());
    }

    #[test]
    fn test_apply_patch_writes_only_present_fields() {
        let mut g = sample();
        let later = g.created_at + Duration::seconds(5);
        let patch = GrievancePatch {
            external_status: Some(FieldUpdate::Set("resolved".to_string())),
            ..Default::default()
        };
        let written = g.apply_patch(&patch, later);
        assert_eq!(written, vec!["external_status"]);
        assert_eq!(g.external_status.as_deref(), Some("resolved"));
        assert_eq!(g.island.as_deref(), Some("Tarawa"));
        assert_eq!(g.updated_at, later);
    }

    #[test]
    fn test_apply_patch_clear_unsets_field() {
        let mut g = sample();
        g.category_type = Some("1.1 Inquiries".to_string());
        let patch = GrievancePatch {
            category_type: Some(FieldUpdate::Clear),
            ..Default::default()
        };
        let written = g.apply_patch(&patch, Utc::now());
        assert_eq!(written, vec!["category_type"]);
        assert!(g.category_type.is_none());
    }

    #[test]
    fn test_apply_patch_reports_canonical_order() {
        let mut g = sample();
        let patch = GrievancePatch {
            village: Some(FieldUpdate::Set("Tabontebike".to_string())),
            external_status_note: Some(FieldUpdate::Set("visited".to_string())),
            hh_id: Some(FieldUpdate::Set("HH123".to_string())),
            ..Default::default()
        };
        let written = g.apply_patch(&patch, Utc::now());
        assert_eq!(written, vec!["external_status_note", "hh_id", "village"]);
    }

    #[test]
    fn test_field_update_from_text() {
        assert_eq!(FieldUpdate::from_text(String::new()), FieldUpdate::Clear);
        assert_eq!(FieldUpdate::from_text("  ".to_string()), FieldUpdate::Clear);
        assert_eq!(
            FieldUpdate::from_text("open".to_string()),
            FieldUpdate::Set("open".to_string())
        );
    }

    #[test]
    fn test_household_lookup_key() {
        let mut patch = GrievancePatch::default();
        assert!(patch.household_lookup_key().is_none());
        patch.hh_id = Some(FieldUpdate::Clear);
        assert!(patch.household_lookup_key().is_none());
        patch.hh_id = Some(FieldUpdate::Set("HH123".to_string()));
        assert_eq!(patch.household_lookup_key(), Some("HH123"));
    }

    #[test]
    fn test_empty_patch() {
        assert!(GrievancePatch::default().is_empty());
        let patch = GrievancePatch {
            hh_id: Some(FieldUpdate::Clear),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_attachment_serializes_type_field() {
        let att = Attachment {
            name: "photo.jpg".to_string(),
            url: "http://minio:9000/grievance-bucket/abc.jpg".to_string(),
            size: 1024,
            content_type: "image/jpeg".to_string(),
        };
        let json = serde_json::to_value(&att).unwrap();
        assert_eq!(json["type"], "image/jpeg");
        assert!(json.get("content_type").is_none());
    }

    #[test]
    fn test_batch_item_result_omits_error_on_success() {
        let ok = BatchItemResult::success("GRV-X", vec!["hh_id"]);
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["updated_fields"][0], "hh_id");

        let failed = BatchItemResult::failure("GRV-Y", "Grievance not found");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "Grievance not found");
    }
}
