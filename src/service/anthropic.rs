//! Anthropic Messages API client for job/resume matching.

use async_trait::async_trait;
use serde_json::json;

use crate::config::{credential_from_env, ANTHROPIC_KEY_VAR};
use crate::error::{AppError, Result};

const API_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const MAX_TOKENS: u32 = 1024;

/// Seam for the AI scoring service so pipelines can be tested with canned
/// responses.
#[async_trait]
pub trait ScoreClient: Send + Sync {
    /// Send one prompt, return the model's text response.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl AnthropicClient {
    /// Fails with a configuration error before any request is made if the
    /// API credential is missing.
    pub fn from_env() -> Result<Self> {
        let api_key = credential_from_env(ANTHROPIC_KEY_VAR)?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: API_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Point the client at a different endpoint (tests use a mock server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ScoreClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request_body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [{
                "role": "user",
                "content": prompt
            }]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::fetch(format!("AI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::fetch(format!(
                "AI service error {}: {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::fetch(format!("failed to parse AI response: {}", e)))?;

        let text = response_json["content"][0]["text"]
            .as_str()
            .ok_or_else(|| AppError::parse("AI response carried no text content"))?
            .to_string();

        Ok(text)
    }
}
