// src/ai/client.rs

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{ai::retry::RetryPolicy, config::Config, error::ExamError};

/// A hosted text-generation model: prompt in, free-text completion out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ExamError>;
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Result<Self, ExamError> {
        let client = reqwest::Client::builder()
            .timeout(retry.timeout)
            .build()
            .map_err(|e| ExamError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ExamError> {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
            RetryPolicy {
                max_attempts: config.llm_max_attempts,
                base_delay: config.llm_retry_base,
                timeout: config.llm_timeout,
            },
        )
    }

    async fn generate_attempt(&self, prompt: &str, temperature: f32) -> Result<String, ExamError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let payload = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": temperature
            }
        });

        let res = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            let message = format!("API Error {}: {}", status, err_text);
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                ExamError::transient(message)
            } else {
                ExamError::generation(message)
            });
        }

        let body: Value = res.json().await?;

        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ExamError::generation("No text content returned"))
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ExamError> {
        let label = format!("Gemini call ({})", self.model);
        let text = self
            .retry
            .run(&label, || self.generate_attempt(prompt, temperature))
            .await?;
        tracing::debug!("Gemini returned {} bytes", text.len());
        Ok(text)
    }
}
