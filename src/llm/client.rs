//! Core LLM client trait, error type and a scripted mock

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::types::{CompletionRequest, CompletionResponse, Usage};

/// Stateless LLM client - each call is independent
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited (429), retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },
}

impl LlmError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::Network(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::Timeout(_) => true,
            LlmError::MissingApiKey { .. } => false,
        }
    }
}

/// A canned reply for [`MockLlmClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Content(String),
    RateLimited,
    ApiError { status: u16, message: String },
}

impl MockReply {
    fn into_result(self, model: &str, usage: Usage) -> Result<CompletionResponse, LlmError> {
        match self {
            MockReply::Content(content) => Ok(CompletionResponse {
                model: model.to_string(),
                content,
                finish_reason: Some("stop".to_string()),
                usage,
            }),
            MockReply::RateLimited => Err(LlmError::RateLimited { retry_after: None }),
            MockReply::ApiError { status, message } => Err(LlmError::ApiError { status, message }),
        }
    }
}

/// Scripted LLM client: one fixed reply per model, plus an optional default.
///
/// Records every request it receives so tests can assert on call order.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: HashMap<String, MockReply>,
    default_reply: Option<MockReply>,
    usage: Usage,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to every model with `content`.
    pub fn answering(content: impl Into<String>) -> Self {
        Self::new().with_default(MockReply::Content(content.into()))
    }

    pub fn with_reply(mut self, model: impl Into<String>, reply: MockReply) -> Self {
        self.replies.insert(model.into(), reply);
        self
    }

    pub fn with_default(mut self, reply: MockReply) -> Self {
        self.default_reply = Some(reply);
        self
    }

    /// Token usage reported with every content reply.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Requests received so far, in order.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Models requested so far, in order.
    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.model).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = request.model.clone();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }

        let reply = self
            .replies
            .get(&model)
            .or(self.default_reply.as_ref())
            .cloned()
            .unwrap_or(MockReply::ApiError {
                status: 404,
                message: format!("mock has no reply for model {}", model),
            });

        reply.into_result(&model, self.usage)
    }
}
