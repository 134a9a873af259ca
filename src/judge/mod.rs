//! Remote difficulty judge.
//!
//! The judge is a second opinion on the local classifier. For every candidate
//! it asks a remote LLM to confirm or revise the difficulty and to write a
//! short solution guide, returning the raw JSON content for the caller to
//! parse.
//!
//! ## Budget controls
//!
//! 1. **Pacing** - a fixed sleep before every call, whatever the outcome, keeps
//!    the request rate under the provider's per-minute ceiling.
//! 2. **Bounded input** - the issue body is cut to `max_body_chars`.
//! 3. **Model fallback** - models are tried in order; a throttled or failing
//!    model hands over to the next one immediately.

pub mod prompt;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::llm::{CompletionRequest, Exhausted, FallbackPolicy, LlmClient, LlmError, Usage};
use crate::text::preview;

pub use prompt::{EMPTY_BODY_PLACEHOLDER, IssueBrief, build_prompt};

/// Default ordered model list, most capable first.
pub const DEFAULT_MODELS: [&str; 2] = ["llama-3.3-70b-versatile", "llama-3.1-8b-instant"];

/// Result of asking the judge about one issue.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeOutcome {
    /// A model answered; `content` is its raw output.
    Answered { model: String, content: String },
    /// No model answered. The caller skips the issue.
    Exhausted(Exhausted),
}

/// LLM judge with pacing and model fallback.
pub struct Judge {
    client: Arc<dyn LlmClient>,
    policy: FallbackPolicy,
    pacing: Duration,
    max_body_chars: usize,
    temperature: f32,
    timeout: Duration,
    usage: Mutex<Usage>,
}

impl Judge {
    /// Create a judge with the default model list and budget.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            policy: FallbackPolicy::new(DEFAULT_MODELS),
            pacing: Duration::from_secs(7),
            max_body_chars: 6000,
            temperature: 0.1,
            timeout: Duration::from_secs(60),
            usage: Mutex::new(Usage::default()),
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the sleep before every call.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_max_body_chars(mut self, max_body_chars: usize) -> Self {
        self.max_body_chars = max_body_chars;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tokens spent on answered calls so far.
    pub fn usage(&self) -> Usage {
        self.usage.lock().map(|u| *u).unwrap_or_default()
    }

    /// Ask the judge about one issue.
    pub async fn evaluate(&self, brief: &IssueBrief<'_>) -> JudgeOutcome {
        log::info!("Judge reviewing '{}' ({})", preview(brief.title, 40), brief.repo);

        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }

        let prompt = build_prompt(brief, self.max_body_chars);

        let result = self
            .policy
            .execute(|model| {
                log::debug!("Judge attempt with model {}", model);
                let request = CompletionRequest::new(model)
                    .with_user_message(prompt.clone())
                    .with_temperature(self.temperature)
                    .json_object();
                let client = Arc::clone(&self.client);
                let timeout = self.timeout;
                async move {
                    tokio::time::timeout(timeout, client.complete(request))
                        .await
                        .map_err(|_| LlmError::Timeout(timeout))?
                }
            })
            .await;

        match result {
            Ok(attempted) => {
                if let Ok(mut total) = self.usage.lock() {
                    total.add(&attempted.value.usage);
                }
                JudgeOutcome::Answered {
                    model: attempted.model,
                    content: attempted.value.content,
                }
            }
            Err(exhausted) => {
                log::warn!(
                    "All judge models exhausted for '{}' ({}), skipping",
                    preview(brief.title, 40),
                    brief.repo
                );
                JudgeOutcome::Exhausted(exhausted)
            }
        }
    }
}
