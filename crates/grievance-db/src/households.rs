//! Household registry lookup.
//!
//! The registry maps household ids to their registered location. It is
//! loaded once at startup, from a JSON file when configured, otherwise from
//! the built-in table.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use grievance_core::{Error, HouseholdDirectory, HouseholdLocation, Result};

#[derive(Debug, Clone)]
pub struct StaticHouseholdDirectory {
    entries: HashMap<String, HouseholdLocation>,
}

impl StaticHouseholdDirectory {
    pub fn new(entries: HashMap<String, HouseholdLocation>) -> Self {
        Self { entries }
    }

    /// Load `{"HH123": {"island": "...", "district": "...", "village": "..."}, ...}`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "cannot read household directory {}: {}",
                path.display(),
                e
            ))
        })?;
        let entries: HashMap<String, HouseholdLocation> = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("invalid household directory JSON: {}", e)))?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StaticHouseholdDirectory {
    fn default() -> Self {
        let entries = [
            ("HH123", "Maiana", "North", "Tabontebike"),
            ("HH456", "Abemama", "West", "Kariatebike"),
        ]
        .into_iter()
        .map(|(id, island, district, village)| {
            (
                id.to_string(),
                HouseholdLocation {
                    island: island.to_string(),
                    district: district.to_string(),
                    village: village.to_string(),
                },
            )
        })
        .collect();
        Self { entries }
    }
}

#[async_trait]
impl HouseholdDirectory for StaticHouseholdDirectory {
    async fn lookup(&self, hh_id: &str) -> Result<Option<HouseholdLocation>> {
        Ok(self.entries.get(hh_id.trim()).cloned())
    }
}
