//! Provider abstraction for chat-completion models.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{Error, Result};

/// One chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// System prompt, if any.
    pub system_prompt: Option<String>,
    /// User message.
    pub user_message: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl CompletionRequest {
    /// Create a request for `model` with the provider defaults.
    #[must_use]
    pub fn new(model: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            user_message: user_message.into(),
            max_tokens: 600,
            temperature: 0.2,
        }
    }

    /// Set the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the token limit.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generated text, trimmed.
    pub content: String,
    /// Model that answered, as reported by the provider.
    pub model: String,
}

/// A chat-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}

/// Provider returning canned responses in order.
///
/// Requests are kept so tests can assert on what was sent.
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmProvider {
    /// Create a mock that answers with `responses`, one per call.
    #[must_use]
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let model = request.model.clone();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self
            .responses
            .lock()
            .map_err(|_| Error::internal("mock provider lock poisoned"))?
            .pop_front();

        next.map(|content| Completion {
            content: content.trim().to_string(),
            model,
        })
        .ok_or_else(|| Error::provider(None, "mock provider has no responses left"))
    }
}
