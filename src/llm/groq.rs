//! Groq API client implementation
//!
//! Groq speaks the OpenAI chat-completions protocol, so this client works
//! against any endpoint that does (`base_url` is configurable).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::llm::client::{LlmClient, LlmError};
use crate::llm::types::{CompletionRequest, CompletionResponse, ResponseFormat, Role, Usage};

/// Groq OpenAI-compatible base URL
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";

/// Environment variable holding the API key
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Configuration for the Groq client
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: GROQ_API_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GroqConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Groq API client
pub struct GroqClient {
    client: Client,
    api_key: String,
    config: GroqConfig,
}

impl GroqClient {
    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: GroqConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the request body for the chat-completions endpoint
    fn build_request(&self, request: &CompletionRequest) -> Value {
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::System => "system",
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    "content": m.content
                })
            })
            .collect();

        let mut body = json!({
            "model": request.model,
            "messages": messages
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        if request.response_format == ResponseFormat::JsonObject {
            body["response_format"] = json!({ "type": "json_object" });
        }

        body
    }

    /// Parse the API response into a CompletionResponse
    fn parse_response(&self, requested_model: &str, body: Value) -> Result<CompletionResponse, LlmError> {
        let choice = body["choices"]
            .get(0)
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;

        let content = choice["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::InvalidResponse("choice has no message content".to_string()))?
            .to_string();

        let usage = if let Some(u) = body.get("usage") {
            Usage::new(
                u["prompt_tokens"].as_u64().unwrap_or(0),
                u["completion_tokens"].as_u64().unwrap_or(0),
            )
        } else {
            Usage::default()
        };

        Ok(CompletionResponse {
            model: body["model"].as_str().unwrap_or(requested_model).to_string(),
            content,
            finish_reason: choice["finish_reason"].as_str().map(str::to_string),
            usage,
        })
    }

    /// Send a request to the chat-completions endpoint
    async fn send_request(&self, body: Value) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        // Handle rate limiting
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(LlmError::RateLimited { retry_after });
        }

        // Handle other errors
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey {
                env_var: GROQ_API_KEY_ENV.to_string(),
            });
        }

        let body = self.build_request(&request);
        let response = self.send_request(body).await?;
        self.parse_response(&request.model, response)
    }
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GroqClient {
        GroqClient::with_api_key("test-key".to_string(), GroqConfig::default()).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = GroqConfig::default();
        assert_eq!(config.base_url, GROQ_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let client = GroqClient::with_api_key(
            "k".to_string(),
            GroqConfig::default().with_base_url("http://localhost:9999/v1/"),
        )
        .unwrap();
        assert_eq!(client.completions_url(), "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn test_build_request_json_mode() {
        let request = CompletionRequest::new("llama-3.3-70b-versatile")
            .with_user_message("Hello")
            .with_temperature(0.1)
            .json_object();

        let body = client().build_request(&request);

        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_build_request_text_mode_omits_format() {
        let request = CompletionRequest::new("m").with_user_message("Hello");
        let body = client().build_request(&request);
        assert!(body.get("response_format").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_parse_response() {
        let client = client();
        let response = client
            .parse_response(
                "llama-3.1-8b-instant",
                json!({
                    "model": "llama-3.1-8b-instant",
                    "choices": [{
                        "index": 0,
                        "message": { "role": "assistant", "content": "{\"verified_difficulty\":\"Novice\"}" },
                        "finish_reason": "stop"
                    }],
                    "usage": { "prompt_tokens": 120, "completion_tokens": 30 }
                }),
            )
            .unwrap();

        assert_eq!(response.content, "{\"verified_difficulty\":\"Novice\"}");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage, Usage::new(120, 30));
        assert_eq!(response.usage.total(), 150);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let result = client().parse_response("m", json!({ "choices": [] }));
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let debug_str = format!("{:?}", client());
        assert!(debug_str.contains("GroqClient"));
        assert!(!debug_str.contains("test-key"));
    }

    #[tokio::test]
    async fn test_blank_api_key_fails_before_sending() {
        let client = GroqClient::with_api_key("  ".to_string(), GroqConfig::default()).unwrap();
        let result = client.complete(CompletionRequest::new("m").with_user_message("hi")).await;
        assert!(matches!(result, Err(LlmError::MissingApiKey { env_var }) if env_var == GROQ_API_KEY_ENV));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GroqClient>();
    }
}
