//! The LLM backend trait and a scripted mock implementation.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{LlmError, Result};
use crate::types::{GenerateRequest, GenerateResponse};

/// A text-generation service with optional function calling.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Run one generation request.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// The model requests are sent to.
    fn model(&self) -> &str;
}

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn LlmBackend>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

/// A scripted response for [`MockBackend`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this response.
    Reply(GenerateResponse),
    /// Fail with a backend error carrying this message.
    Fail(String),
}

/// Mock backend for testing.
///
/// Responses are returned in order. Once they run out, every further request
/// fails.
pub struct MockBackend {
    responses: Mutex<Vec<MockResponse>>,
    request_log: Mutex<Vec<GenerateRequest>>,
}

impl MockBackend {
    /// Create a mock backend with the given scripted responses.
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            request_log: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock backend with a single text response.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![MockResponse::Reply(GenerateResponse::text_only(text))])
    }

    /// Create a mock backend whose every request fails.
    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    /// Get all requests that were made to this backend.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.request_log.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().len()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        self.request_log.lock().push(request);

        let mut responses = self.responses.lock();
        if responses.is_empty() {
            return Err(LlmError::Backend(
                "MockBackend: no more responses available".to_string(),
            ));
        }
        match responses.remove(0) {
            MockResponse::Reply(response) => Ok(response),
            MockResponse::Fail(message) => Err(LlmError::Backend(message)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
