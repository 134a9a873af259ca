//! Hugging Face inference API backend for the zero-shot model.
//!
//! Posts `{"inputs", "parameters": {"candidate_labels", "multi_label"}}` to
//! `{endpoint}/models/{model}`. Both response shapes the service has used are
//! accepted: the classic `{sequence, labels, scores}` object and a list of
//! `{label, score}` pairs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::model::{ClassifierError, ZeroShotModel, ZeroShotOutput};

pub const HF_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference";

pub const DEFAULT_ZERO_SHOT_MODEL: &str = "MoritzLaurer/DeBERTa-v3-base-mnli-fever-anli";

/// Environment variable holding the optional API token
pub const HF_API_TOKEN_ENV: &str = "HF_API_TOKEN";

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            endpoint: HF_INFERENCE_URL.to_string(),
            model: DEFAULT_ZERO_SHOT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HfResponse {
    Ranked { labels: Vec<String>, scores: Vec<f64> },
    Pairs(Vec<LabelScore>),
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

impl From<HfResponse> for ZeroShotOutput {
    fn from(response: HfResponse) -> Self {
        match response {
            HfResponse::Ranked { labels, scores } => ZeroShotOutput { labels, scores },
            HfResponse::Pairs(pairs) => ZeroShotOutput::new(pairs.into_iter().map(|p| (p.label, p.score))),
        }
    }
}

/// Zero-shot classification over the HF inference HTTP API.
pub struct HuggingFaceModel {
    client: Client,
    token: Option<String>,
    config: HuggingFaceConfig,
}

impl HuggingFaceModel {
    /// Build the model handle. The token is optional; anonymous calls are
    /// more tightly rate limited.
    pub fn new(config: HuggingFaceConfig, token: Option<String>) -> Result<Self, ClassifierError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, token, config })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.config.endpoint.trim_end_matches('/'), self.config.model)
    }
}

#[async_trait]
impl ZeroShotModel for HuggingFaceModel {
    async fn classify(&self, text: &str, labels: &[&str]) -> Result<ZeroShotOutput, ClassifierError> {
        let body = json!({
            "inputs": text,
            "parameters": {
                "candidate_labels": labels,
                "multi_label": false
            }
        });

        let mut request = self.client.post(self.model_url()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let parsed: HfResponse =
            serde_json::from_str(&text).map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;
        let output = ZeroShotOutput::from(parsed);

        if output.labels.len() != output.scores.len() {
            return Err(ClassifierError::InvalidResponse(format!(
                "{} labels but {} scores",
                output.labels.len(),
                output.scores.len()
            )));
        }

        Ok(output)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for HuggingFaceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceModel")
            .field("endpoint", &self.config.endpoint)
            .field("model", &self.config.model)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}
