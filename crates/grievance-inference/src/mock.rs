//! Mock generation backend for deterministic testing.
//!
//! ```rust
//! use grievance_inference::mock::MockGenerationBackend;
//!
//! let backend = MockGenerationBackend::new()
//!     .with_fixed_response(r#"{"category":"1","subcategory":"1.1"}"#);
//! assert_eq!(backend.call_count(), 0);
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use grievance_core::{Error, GenerationBackend, Result};

/// One recorded `generate_with_system` call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub prompt: String,
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Failure(String),
}

/// Mock generation backend that returns a fixed reply and records calls.
#[derive(Clone)]
pub struct MockGenerationBackend {
    reply: MockReply,
    model: String,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            reply: MockReply::Text("{}".to_string()),
            model: "mock-model".to_string(),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the reply returned for every request.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        self.reply = MockReply::Text(response.into());
        self
    }

    /// Make every request fail with an inference error.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.reply = MockReply::Failure(message.into());
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.call_log.lock().unwrap().push(MockCall {
            system: system.to_string(),
            prompt: prompt.to_string(),
        });
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Failure(msg) => Err(Error::Inference(msg.clone())),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
