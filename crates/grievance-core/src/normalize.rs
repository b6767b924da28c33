//! Input normalization for grievance submissions.
//!
//! Clients (web form, chatbot flows, the case-management system) send the same
//! record in different shapes. `GrievanceSubmission` accepts all of them and
//! `GrievanceSubmission::normalize` maps the result onto the canonical
//! `NewGrievance`:
//!
//! - `details` wins over its alias `grievance_details`
//! - every optional text field sent as `""` becomes null
//! - `details` is trimmed and capped at [`DETAILS_MAX_CHARS`]
//! - `attachments` may be a list, a single object, or a JSON-encoded string of
//!   either; malformed items are dropped and an unparseable string is ignored
//! - a client-supplied `id` is ignored

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::defaults::{ANONYMOUS_BY_DEFAULT, DETAILS_MAX_CHARS};
use crate::error::{Error, Result};
use crate::models::{Attachment, NewGrievance};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").unwrap());

// =============================================================================
// TRI-STATE KEYS
// =============================================================================

/// A JSON key that may be missing, explicitly null, or carry a value.
///
/// Use with `#[serde(default)]` so a missing key deserializes to `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Presence<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Presence<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Presence::Absent)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Presence::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Presence<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Presence::Value(v),
            None => Presence::Null,
        })
    }
}

// =============================================================================
// ATTACHMENTS
// =============================================================================

/// Every shape the `attachments` field arrives in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttachmentsInput {
    /// JSON text holding a list or a single descriptor.
    Encoded(String),
    Many(Vec<Value>),
    Single(Map<String, Value>),
    /// Numbers, booleans: nothing usable.
    Unsupported(Value),
}

impl AttachmentsInput {
    /// Coerce into descriptors. Never fails: unusable input yields `None`,
    /// and an empty result is reported as `None` too.
    pub fn into_attachments(self) -> Option<Vec<Attachment>> {
        let items = match self {
            AttachmentsInput::Encoded(text) => {
                if text.trim().is_empty() {
                    return None;
                }
                match serde_json::from_str::<Value>(&text) {
                    Ok(Value::Array(items)) => items,
                    Ok(Value::Object(map)) => vec![Value::Object(map)],
                    Ok(_) => return None,
                    Err(e) => {
                        tracing::debug!(error = %e, "Ignoring unparseable attachments string");
                        return None;
                    }
                }
            }
            AttachmentsInput::Many(items) => items,
            AttachmentsInput::Single(map) => vec![Value::Object(map)],
            AttachmentsInput::Unsupported(_) => return None,
        };

        let total = items.len();
        let out: Vec<Attachment> = items.into_iter().filter_map(coerce_attachment).collect();
        if out.len() < total {
            tracing::debug!(
                kept = out.len(),
                dropped = total - out.len(),
                "Dropped malformed attachment descriptors"
            );
        }
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

/// Coerce one list item. `null` becomes an all-default descriptor.
fn coerce_attachment(item: Value) -> Option<Attachment> {
    let map = match item {
        Value::Null => return Some(Attachment::default()),
        Value::Object(map) => map,
        _ => return None,
    };
    Some(Attachment {
        name: text_or_default(map.get("name"))?,
        url: text_or_default(map.get("url"))?,
        size: size_or_default(map.get("size"))?,
        content_type: text_or_default(map.get("type"))?,
    })
}

fn text_or_default(v: Option<&Value>) -> Option<String> {
    match v {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => None,
    }
}

fn size_or_default(v: Option<&Value>) -> Option<i64> {
    match v {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    }
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// Raw creation body, as loose as clients send it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrievanceSubmission {
    /// Detected so it can be reported; never used as the record id.
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_anonymous: Option<bool>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub complainant_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub complainant_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub complainant_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub complainant_gender: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_hh_registered: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub hh_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub hh_address: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub island: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub village: Option<String>,

    #[serde(default)]
    pub category_type: Presence<String>,

    #[serde(default)]
    pub details: Presence<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub grievance_details: Option<String>,

    /// Display-only text from chatbot flows; accepted and discarded.
    #[serde(default)]
    pub grievance_details_attachment_friendly: Option<Value>,

    #[serde(default)]
    pub attachments: Option<AttachmentsInput>,
}

/// Outcome of normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSubmission {
    pub grievance: NewGrievance,
    /// Whether the raw body carried a `category_type` key at all.
    pub category_key_present: bool,
    /// Whether the client tried to supply its own id.
    pub client_id_supplied: bool,
}

impl NormalizedSubmission {
    /// Auto-categorization runs only when the category key was missing
    /// entirely and there is narrative text to classify.
    pub fn wants_auto_category(&self) -> bool {
        !self.category_key_present && self.grievance.details.is_some()
    }
}

impl GrievanceSubmission {
    pub fn normalize(self) -> Result<NormalizedSubmission> {
        let client_id_supplied = matches!(&self.id, Some(v) if !v.is_null());
        let category_key_present = !self.category_type.is_absent();

        let raw_details = if self.details.is_absent() {
            self.grievance_details
        } else {
            self.details.into_option()
        };
        let details = normalize_details(raw_details)?;

        let is_anonymous = self.is_anonymous.unwrap_or(ANONYMOUS_BY_DEFAULT);
        let (name, email, phone, gender) = if is_anonymous {
            (None, None, None, None)
        } else {
            (
                blank_to_none(self.complainant_name),
                blank_to_none(self.complainant_email),
                blank_to_none(self.complainant_phone),
                blank_to_none(self.complainant_gender),
            )
        };
        if let Some(email) = &email {
            if !EMAIL_PATTERN.is_match(email) {
                return Err(Error::InvalidInput(format!(
                    "complainant_email is not a valid email address: {}",
                    email
                )));
            }
        }

        let grievance = NewGrievance {
            is_anonymous,
            complainant_name: name,
            complainant_email: email,
            complainant_phone: phone,
            complainant_gender: gender,
            is_hh_registered: self.is_hh_registered,
            hh_id: blank_to_none(self.hh_id),
            hh_address: blank_to_none(self.hh_address),
            island: blank_to_none(self.island),
            district: blank_to_none(self.district),
            village: blank_to_none(self.village),
            category_type: blank_to_none(self.category_type.into_option()),
            details,
            attachments: self.attachments.and_then(AttachmentsInput::into_attachments),
        };

        Ok(NormalizedSubmission {
            grievance,
            category_key_present,
            client_id_supplied,
        })
    }
}

/// Trim and length-check narrative text. Empty after trimming is null.
pub fn normalize_details(raw: Option<String>) -> Result<Option<String>> {
    let text = raw.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Ok(None);
    }
    if text.chars().count() > DETAILS_MAX_CHARS {
        return Err(Error::InvalidInput(
            "Details too long (max 10,000 characters).".to_string(),
        ));
    }
    Ok(Some(text.to_string()))
}

fn blank_to_none(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(de::Error::custom("expected a string")),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => Err(de::Error::custom("expected a boolean")),
        },
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(de::Error::custom(format!("expected a boolean, found '{}'", s))),
        },
        Some(_) => Err(de::Error::custom("expected a boolean")),
    }
}
