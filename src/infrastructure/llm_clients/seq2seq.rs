//! Client for a hosted seq2seq text-to-SQL model (T5 family) behind a
//! text-generation-inference style endpoint.
//!
//! Seq2seq models have no system role, so the system text is prepended to
//! the user text to form the single `inputs` string.

use super::LLMClient;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct GenerateRequest {
    inputs: String,
    parameters: GenerateParameters,
}

#[derive(Serialize)]
struct GenerateParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Servers answer with either a single object or a one-element list.
#[derive(Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    One(GeneratedText),
    Many(Vec<GeneratedText>),
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        match self {
            GenerateResponse::One(g) => Some(g.generated_text),
            GenerateResponse::Many(list) => list.into_iter().next().map(|g| g.generated_text),
        }
    }
}

pub struct Seq2SeqClient {
    client: reqwest::Client,
}

impl Seq2SeqClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn build_inputs(system: &str, user: &str) -> String {
        let system = system.trim();
        if system.is_empty() {
            user.to_string()
        } else {
            format!("{system}{user}")
        }
    }

    fn parse_response(body: &str) -> Result<String> {
        let parsed: GenerateResponse = serde_json::from_str(body)
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;
        parsed
            .into_text()
            .ok_or_else(|| AppError::LLMError("Empty generation response".to_string()))
    }
}

#[async_trait]
impl LLMClient for Seq2SeqClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        let url = config.base_url.trim_end_matches('/');
        let body = GenerateRequest {
            inputs: Self::build_inputs(system, user),
            parameters: GenerateParameters {
                max_new_tokens: config.max_tokens,
                temperature: config.temperature.filter(|t| *t > 0.0),
            },
        };

        let mut request = self.client.post(url).json(&body);
        if let Some(api_key) = &config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to read response: {}", e)))?;

        Self::parse_response(&text)
    }
}
