//! Ordered model fallback.
//!
//! A `FallbackPolicy` walks an ordered list of models, most capable first.
//! After every failed attempt the error is classified into a decision:
//! try the same model again, advance to the next one, or give up.
//!
//! The default policy never retries the same model. Rate limits advance
//! immediately, with no backoff; only errors no other model could fix
//! (a missing API key) abort the walk.

use std::future::Future;

use thiserror::Error;

use super::client::LlmError;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackDecision {
    RetrySame,
    Advance,
    Abort,
}

/// One failed attempt, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFailure {
    pub model: String,
    pub message: String,
    pub rate_limited: bool,
}

impl ModelFailure {
    fn new(model: &str, error: &LlmError) -> Self {
        Self {
            model: model.to_string(),
            message: error.to_string(),
            rate_limited: error.is_rate_limit(),
        }
    }
}

/// The value produced by the first successful attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub model: String,
    pub value: T,
}

/// Every model failed (or the policy aborted).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("all model attempts failed ({} attempts, aborted: {aborted})", failures.len())]
pub struct Exhausted {
    pub failures: Vec<ModelFailure>,
    pub aborted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    models: Vec<String>,
    retries_per_model: u32,
}

impl FallbackPolicy {
    pub fn new(models: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            models: models.into_iter().map(Into::into).collect(),
            retries_per_model: 0,
        }
    }

    /// Allow this many extra attempts on the same model for retryable,
    /// non-rate-limit errors.
    pub fn with_retries_per_model(mut self, retries: u32) -> Self {
        self.retries_per_model = retries;
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Classify a failed attempt.
    pub fn decide(&self, error: &LlmError, retries_used: u32) -> FallbackDecision {
        match error {
            LlmError::MissingApiKey { .. } => FallbackDecision::Abort,
            LlmError::RateLimited { .. } => FallbackDecision::Advance,
            e if e.is_retryable() && retries_used < self.retries_per_model => FallbackDecision::RetrySame,
            _ => FallbackDecision::Advance,
        }
    }

    /// Run `attempt` against each model in order until one succeeds.
    pub async fn execute<T, F, Fut>(&self, mut attempt: F) -> Result<Attempted<T>, Exhausted>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut failures = Vec::new();

        'models: for model in &self.models {
            let mut retries_used = 0;
            loop {
                let error = match attempt(model.clone()).await {
                    Ok(value) => {
                        return Ok(Attempted {
                            model: model.clone(),
                            value,
                        });
                    }
                    Err(error) => error,
                };

                if error.is_rate_limit() {
                    log::warn!("Rate limit hit on {}, switching model", model);
                } else {
                    log::warn!("Model {} failed: {}", model, error);
                }
                failures.push(ModelFailure::new(model, &error));

                match self.decide(&error, retries_used) {
                    FallbackDecision::RetrySame => retries_used += 1,
                    FallbackDecision::Advance => continue 'models,
                    FallbackDecision::Abort => {
                        return Err(Exhausted {
                            failures,
                            aborted: true,
                        });
                    }
                }
            }
        }

        Err(Exhausted {
            failures,
            aborted: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn api_error(status: u16) -> LlmError {
        LlmError::ApiError {
            status,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_decide_default_policy() {
        let policy = FallbackPolicy::new(["a", "b"]);
        assert_eq!(
            policy.decide(&LlmError::RateLimited { retry_after: None }, 0),
            FallbackDecision::Advance
        );
        assert_eq!(policy.decide(&api_error(500), 0), FallbackDecision::Advance);
        assert_eq!(policy.decide(&api_error(400), 0), FallbackDecision::Advance);
        assert_eq!(
            policy.decide(
                &LlmError::MissingApiKey {
                    env_var: "GROQ_API_KEY".to_string()
                },
                0
            ),
            FallbackDecision::Abort
        );
    }

    #[test]
    fn test_decide_with_retries() {
        let policy = FallbackPolicy::new(["a"]).with_retries_per_model(1);
        assert_eq!(policy.decide(&api_error(503), 0), FallbackDecision::RetrySame);
        assert_eq!(policy.decide(&api_error(503), 1), FallbackDecision::Advance);
        assert_eq!(policy.decide(&api_error(400), 0), FallbackDecision::Advance);
        assert_eq!(
            policy.decide(&LlmError::RateLimited { retry_after: None }, 0),
            FallbackDecision::Advance
        );
    }

    #[tokio::test]
    async fn test_execute_first_model_wins() {
        let policy = FallbackPolicy::new(["big", "small"]);
        let tried = RefCell::new(Vec::new());

        let result = policy
            .execute(|model| {
                tried.borrow_mut().push(model.clone());
                async move { Ok::<_, LlmError>(format!("answer from {}", model)) }
            })
            .await
            .unwrap();

        assert_eq!(result.model, "big");
        assert_eq!(result.value, "answer from big");
        assert_eq!(*tried.borrow(), vec!["big"]);
    }

    #[tokio::test]
    async fn test_execute_falls_back_on_rate_limit() {
        let policy = FallbackPolicy::new(["big", "small"]);

        let result = policy
            .execute(|model| async move {
                if model == "big" {
                    Err(LlmError::RateLimited { retry_after: None })
                } else {
                    Ok(model)
                }
            })
            .await
            .unwrap();

        assert_eq!(result.model, "small");
    }

    #[tokio::test]
    async fn test_execute_exhausted() {
        let policy = FallbackPolicy::new(["big", "small"]);

        let err = policy
            .execute(|model| async move {
                if model == "big" {
                    Err::<(), _>(LlmError::RateLimited { retry_after: None })
                } else {
                    Err(api_error(500))
                }
            })
            .await
            .unwrap_err();

        assert!(!err.aborted);
        assert_eq!(err.failures.len(), 2);
        assert!(err.failures[0].rate_limited);
        assert!(!err.failures[1].rate_limited);
        assert_eq!(err.failures[1].model, "small");
    }

    #[tokio::test]
    async fn test_execute_abort_stops_walk() {
        let policy = FallbackPolicy::new(["big", "small"]);
        let calls = RefCell::new(0);

        let err = policy
            .execute(|_model| {
                *calls.borrow_mut() += 1;
                async {
                    Err::<(), _>(LlmError::MissingApiKey {
                        env_var: "GROQ_API_KEY".to_string(),
                    })
                }
            })
            .await
            .unwrap_err();

        assert!(err.aborted);
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn test_execute_retry_same_model() {
        let policy = FallbackPolicy::new(["only"]).with_retries_per_model(2);
        let calls = RefCell::new(0);

        let result = policy
            .execute(|model| {
                *calls.borrow_mut() += 1;
                let n = *calls.borrow();
                async move { if n < 3 { Err(api_error(502)) } else { Ok(model) } }
            })
            .await
            .unwrap();

        assert_eq!(result.model, "only");
        assert_eq!(*calls.borrow(), 3);
    }

    #[tokio::test]
    async fn test_execute_empty_model_list() {
        let policy = FallbackPolicy::new(Vec::<String>::new());
        let err = policy
            .execute(|model| async move { Ok::<_, LlmError>(model) })
            .await
            .unwrap_err();
        assert!(err.failures.is_empty());
        assert!(!err.aborted);
    }
}
