//! LLM-backed categorization advisor.
//!
//! Builds the prompt from the loaded taxonomy, asks the generation backend
//! for a JSON object, and coerces whatever comes back into the taxonomy.
//! Upstream failures are returned as errors; malformed model output is not
//! an error and lands in the catch-all category.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use grievance_core::{
    Categorization, CategorizationAdvisor, Confidence, Error, GenerationBackend, Result, Taxonomy,
};

const SYSTEM_PROMPT: &str = "You are an expert grievance categorization assistant for Vaka Sosiale, a social protection program.
Your task is to analyze grievance descriptions and categorize them into the appropriate category and subcategory.

Be precise and consistent in your categorization. Consider the context and intent of the grievance carefully.";

const DEFAULT_REASONING: &str = "Categorized based on content analysis";

/// Raw shape the model is asked to return. Every field is optional; codes may
/// come back as strings or bare numbers.
#[derive(Debug, Default, Deserialize)]
struct RawCategorization {
    #[serde(default)]
    category: Option<Value>,
    #[serde(default)]
    subcategory: Option<Value>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Categorizes grievance details with a chat model.
pub struct LlmCategorizer {
    backend: Arc<dyn GenerationBackend>,
    taxonomy: Arc<Taxonomy>,
}

impl LlmCategorizer {
    pub fn new(backend: Arc<dyn GenerationBackend>, taxonomy: Arc<Taxonomy>) -> Self {
        Self { backend, taxonomy }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    fn user_prompt(&self, details: &str) -> String {
        format!(
            r#"Please categorize the following grievance into the appropriate category and subcategory from the Vaka Sosiale system.

Categories and subcategories:
{listing}

Grievance details:
{details}

Respond with a JSON object containing:
- category: The main category number (e.g., "1", "2")
- subcategory: The subcategory code (e.g., "1.1", "2.3") or null if category {catch_all} ({catch_all_name})
- confidence: "high", "medium", or "low"
- reasoning: Brief explanation (1-2 sentences) for why you chose this category

Example response format:
{{
    "category": "2",
    "subcategory": "2.3",
    "confidence": "high",
    "reasoning": "The grievance clearly states that a household member was not registered during the enrollment process."
}}"#,
            listing = self.taxonomy.prompt_listing(),
            details = details,
            catch_all = self.taxonomy.catch_all().code,
            catch_all_name = self.taxonomy.catch_all().name,
        )
    }

    /// Map a model reply onto the taxonomy.
    pub fn interpret(&self, reply: &str) -> Categorization {
        let raw: RawCategorization = match serde_json::from_str(strip_code_fence(reply)) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "categorizer",
                    error = %e,
                    response_len = reply.len(),
                    "Unparseable categorization response"
                );
                return self.taxonomy.unparseable();
            }
        };

        let category = raw.category.as_ref().and_then(code_text);
        let subcategory = raw.subcategory.as_ref().and_then(code_text);
        let reasoning = raw
            .reasoning
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REASONING.to_string());

        self.taxonomy.resolve(
            category.as_deref(),
            subcategory.as_deref(),
            Confidence::parse_lenient(raw.confidence.as_deref()),
            reasoning,
        )
    }
}

#[async_trait]
impl CategorizationAdvisor for LlmCategorizer {
    async fn categorize(&self, details: &str) -> Result<Categorization> {
        let details = details.trim();
        if details.is_empty() {
            return Err(Error::InvalidInput("Grievance details cannot be empty".to_string()));
        }

        let start = Instant::now();
        let reply = self
            .backend
            .generate_with_system(SYSTEM_PROMPT, &self.user_prompt(details))
            .await?;
        let result = self.interpret(&reply);

        debug!(
            subsystem = "inference",
            component = "categorizer",
            op = "categorize",
            model = %self.backend.model_name(),
            category = %result.category,
            duration_ms = start.elapsed().as_millis() as u64,
            "Categorization complete"
        );
        Ok(result)
    }
}

/// Accept `"2"`, `2`, `"2.3"` or `2.3`; everything else is treated as absent.
fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Models sometimes wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGenerationBackend;

    fn categorizer(reply: &str) -> (LlmCategorizer, MockGenerationBackend) {
        let backend = MockGenerationBackend::new().with_fixed_response(reply);
        let categorizer =
            LlmCategorizer::new(Arc::new(backend.clone()), Arc::new(Taxonomy::default()));
        (categorizer, backend)
    }

    #[tokio::test]
    async fn test_valid_reply() {
        let (c, _) = categorizer(
            r#"{"category":"2","subcategory":"2.3","confidence":"high","reasoning":"Member missing."}"#,
        );
        let result = c.categorize("My son was not registered").await.unwrap();
        assert_eq!(result.category, "2");
        assert_eq!(result.subcategory.as_deref(), Some("2.3"));
        assert_eq!(result.subcategory_name.as_deref(), Some("HH member not registered"));
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.reasoning, "Member missing.");
        assert_eq!(result.display, "2.3 HH member not registered");
    }

    #[tokio::test]
    async fn test_numeric_codes_and_bad_subcategory() {
        let (c, _) = categorizer(r#"{"category":5,"subcategory":9.9}"#);
        let result = c.categorize("The officer asked for money").await.unwrap();
        assert_eq!(result.category, "5");
        assert_eq!(result.subcategory.as_deref(), Some("5.1"));
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(result.reasoning, DEFAULT_REASONING);
    }

    #[tokio::test]
    async fn test_unknown_category_goes_to_catch_all() {
        let (c, _) = categorizer(r#"{"category":"42","subcategory":"42.1","confidence":"high"}"#);
        let result = c.categorize("Something odd").await.unwrap();
        assert_eq!(result.category, "7");
        assert_eq!(result.subcategory, None);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.display, "7. Others (please describe)");
    }

    #[tokio::test]
    async fn test_unparseable_reply() {
        let (c, _) = categorizer("I think this is about registration.");
        let result = c.categorize("Something").await.unwrap();
        assert_eq!(result.category, "7");
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.reasoning, "Unable to parse categorization response");
    }

    #[tokio::test]
    async fn test_fenced_reply() {
        let (c, _) = categorizer("```json\n{\"category\":\"1\",\"subcategory\":\"1.2\"}\n```");
        let result = c.categorize("Please add more offices").await.unwrap();
        assert_eq!(result.subcategory.as_deref(), Some("1.2"));
    }

    #[tokio::test]
    async fn test_empty_details_rejected_without_call() {
        let (c, backend) = categorizer("{}");
        let err = c.categorize("   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_prompt_contains_taxonomy_and_details() {
        let (c, backend) = categorizer(r#"{"category":"1"}"#);
        c.categorize("Where is my payment?").await.unwrap();
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system.contains("Vaka Sosiale"));
        assert!(calls[0].prompt.contains("2.3 HH member not registered"));
        assert!(calls[0].prompt.contains("Where is my payment?"));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let backend = MockGenerationBackend::new().with_failure("upstream down");
        let c = LlmCategorizer::new(Arc::new(backend), Arc::new(Taxonomy::default()));
        let err = c.categorize("text").await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```json{}```"), "{}");
    }
}
