//! # grievance-inference
//!
//! Categorization advisor for the grievance service.
//!
//! - OpenAI-compatible chat backend (`openai`)
//! - Taxonomy-bounded LLM categorizer (`categorizer`)
//! - Deterministic mock backend for tests (`mock`, feature `mock`)

pub mod categorizer;
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use grievance_core::*;

pub use categorizer::LlmCategorizer;
pub use openai::{OpenAIBackend, OpenAIConfig};
