//! OpenAI-compatible chat backend.
//!
//! Works with any endpoint that implements `POST /chat/completions`
//! (OpenAI, Azure OpenAI, vLLM, Ollama in compatibility mode).

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig, DEFAULT_TIMEOUT_SECS};
pub use error::{to_service_error, OpenAIErrorCode};
pub use types::*;
