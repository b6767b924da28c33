//! Closed grievance taxonomy and the rules that keep advisor output inside it.
//!
//! The table is loaded once at startup (built-in or from a JSON file) and
//! shared read-only afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One subcategory, e.g. `2.3 HH member not registered`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub code: String,
    pub name: String,
}

/// One top-level category with its ordered subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

impl Category {
    pub fn subcategory(&self, code: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|s| s.code == code)
    }
}

/// Advisor confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Lenient parse of model output; anything unrecognized is `Medium`.
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("high") => Confidence::High,
            Some("low") => Confidence::Low,
            _ => Confidence::Medium,
        }
    }
}

/// A categorization that is guaranteed to lie inside the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Categorization {
    pub category: String,
    pub subcategory: Option<String>,
    pub category_name: String,
    pub subcategory_name: Option<String>,
    pub confidence: Confidence,
    pub reasoning: String,
    pub display: String,
}

/// The closed category table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    categories: Vec<Category>,
}

impl Taxonomy {
    /// Build from an explicit list. The last category is the catch-all.
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        if categories.is_empty() {
            return Err(Error::Config("taxonomy must contain at least one category".into()));
        }
        Ok(Self { categories })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let categories: Vec<Category> = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid taxonomy JSON: {}", e)))?;
        Self::new(categories)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read taxonomy file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, code: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.code == code)
    }

    /// Catch-all category used for anything outside the table.
    pub fn catch_all(&self) -> &Category {
        // Non-empty by construction.
        &self.categories[self.categories.len() - 1]
    }

    /// Coerce raw advisor output into the taxonomy.
    ///
    /// - unknown category: catch-all, no subcategory, low confidence
    /// - known category, subcategory missing or not in that category: first
    ///   subcategory in table order (if the category has any)
    pub fn resolve(
        &self,
        category: Option<&str>,
        subcategory: Option<&str>,
        confidence: Confidence,
        reasoning: String,
    ) -> Categorization {
        let known = category.map(str::trim).and_then(|code| self.category(code));
        let (cat, confidence, subcategory) = match known {
            Some(cat) => (cat, confidence, subcategory.map(str::trim)),
            None => (self.catch_all(), Confidence::Low, None),
        };

        let sub = subcategory
            .and_then(|code| cat.subcategory(code))
            .or_else(|| cat.subcategories.first());

        Categorization {
            category: cat.code.clone(),
            subcategory: sub.map(|s| s.code.clone()),
            category_name: cat.name.clone(),
            subcategory_name: sub.map(|s| s.name.clone()),
            confidence,
            reasoning,
            display: self.display(&cat.code, sub.map(|s| s.code.as_str())),
        }
    }

    /// Fallback when the advisor produced nothing usable.
    pub fn unparseable(&self) -> Categorization {
        let cat = self.catch_all();
        Categorization {
            category: cat.code.clone(),
            subcategory: None,
            category_name: cat.name.clone(),
            subcategory_name: None,
            confidence: Confidence::Low,
            reasoning: "Unable to parse categorization response".to_string(),
            display: self.display(&cat.code, None),
        }
    }

    /// Render `"2.3 HH member not registered"` or `"1. Inquiries and suggestions"`.
    pub fn display(&self, category: &str, subcategory: Option<&str>) -> String {
        let cat = self.category(category).unwrap_or_else(|| self.catch_all());
        match subcategory.and_then(|code| cat.subcategory(code)) {
            Some(sub) => format!("{} {}", sub.code, sub.name),
            None => format!("{}. {}", cat.code, cat.name),
        }
    }

    /// Indented listing used in categorization prompts.
    pub fn prompt_listing(&self) -> String {
        let mut lines = Vec::new();
        for cat in &self.categories {
            lines.push(format!("{}. {}", cat.code, cat.name));
            for sub in &cat.subcategories {
                lines.push(format!("   {} {}", sub.code, sub.name));
            }
        }
        lines.join("\n")
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        let table: &[(&str, &str, &[(&str, &str)])] = &[
            (
                "1",
                "Inquiries and suggestions",
                &[("1.1", "Inquiries"), ("1.2", "Suggestions/feedback")],
            ),
            (
                "2",
                "Registration related",
                &[
                    ("2.1", "HH not registered - not informed"),
                    ("2.2", "HH not registered - could not attend"),
                    ("2.3", "HH member not registered"),
                    ("2.4", "Request to update data"),
                ],
            ),
            (
                "3",
                "Socioeconomic (PMT classification)",
                &[
                    ("3.1", "Poor/vulnerable excluded"),
                    ("3.2", "Non-poor included"),
                    ("3.3", "HH not registered"),
                ],
            ),
            (
                "4",
                "Misbehavior of registrant",
                &[("4.1", "Fraud (false information)"), ("4.2", "Discourtesy")],
            ),
            (
                "5",
                "Staff performance",
                &[
                    ("5.1", "Fraud"),
                    ("5.2", "Inaction to requests"),
                    ("5.3", "Discourtesy or poor service"),
                    ("5.4", "Collection of any kind"),
                ],
            ),
            (
                "6",
                "Gender-based violence",
                &[
                    ("6.1", "Sexual exploitation and abuse"),
                    ("6.2", "Sexual harassment"),
                ],
            ),
            ("7", "Others (please describe)", &[]),
        ];

        let categories = table
            .iter()
            .map(|(code, name, subs)| Category {
                code: code.to_string(),
                name: name.to_string(),
                subcategories: subs
                    .iter()
                    .map(|(code, name)| Subcategory {
                        code: code.to_string(),
                        name: name.to_string(),
                    })
                    .collect(),
            })
            .collect();
        Self { categories }
    }
}
