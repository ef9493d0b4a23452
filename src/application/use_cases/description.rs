//! Natural-language summaries of an execution result.
//!
//! Describing never fails a request: the LLM-backed describer falls back to
//! the placeholder text on any error or timeout.

use crate::domain::llm_config::LLMConfig;
use crate::domain::query_result::ExecutionOutcome;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::clean_llm_response;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PLACEHOLDER: &str = "good";

#[async_trait]
pub trait DescriptionGenerator {
    async fn describe(&self, prompt: &str, outcome: &ExecutionOutcome) -> String;
}

pub struct PlaceholderDescriber {
    text: String,
}

impl PlaceholderDescriber {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for PlaceholderDescriber {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER)
    }
}

#[async_trait]
impl DescriptionGenerator for PlaceholderDescriber {
    async fn describe(&self, _prompt: &str, _outcome: &ExecutionOutcome) -> String {
        self.text.clone()
    }
}

pub struct LlmDescriber {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    config: LLMConfig,
    timeout: Duration,
    fallback: PlaceholderDescriber,
}

impl LlmDescriber {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        config: LLMConfig,
        timeout: Duration,
        fallback: PlaceholderDescriber,
    ) -> Self {
        Self {
            llm_client,
            config,
            timeout,
            fallback,
        }
    }

    fn build_input(prompt: &str, outcome: &ExecutionOutcome) -> String {
        let result_json = serde_json::to_string(outcome).unwrap_or_default();
        format!(
            "instruction : give me a descriptive answer (at least three words) to prompt based on database query result. prompt : {} , context:{}",
            prompt, result_json
        )
    }

    fn tidy(text: &str) -> String {
        clean_llm_response(text).replace('"', "").trim().to_string()
    }
}

#[async_trait]
impl DescriptionGenerator for LlmDescriber {
    async fn describe(&self, prompt: &str, outcome: &ExecutionOutcome) -> String {
        let input = Self::build_input(prompt, outcome);
        let call = self.llm_client.generate(
            &self.config,
            "You summarise database query results for end users in one short sentence.",
            &input,
        );

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => {
                let text = Self::tidy(&text);
                if text.is_empty() {
                    warn!("Describer returned empty text, using placeholder");
                    self.fallback.describe(prompt, outcome).await
                } else {
                    text
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Description failed, using placeholder");
                self.fallback.describe(prompt, outcome).await
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Description timed out, using placeholder"
                );
                self.fallback.describe(prompt, outcome).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{AppError, Result};
    use crate::domain::query_result::QueryResult;

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    struct StubClient(Reply);

    #[async_trait]
    impl LLMClient for StubClient {
        async fn generate(&self, _config: &LLMConfig, _system: &str, user: &str) -> Result<String> {
            assert!(user.contains("context:"));
            match self.0 {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(AppError::LLMError("connection refused".into())),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok("too late".to_string())
                }
            }
        }
    }

    fn describer(reply: Reply) -> LlmDescriber {
        LlmDescriber::new(
            Arc::new(StubClient(reply)),
            LLMConfig::default(),
            Duration::from_millis(50),
            PlaceholderDescriber::default(),
        )
    }

    fn outcome() -> ExecutionOutcome {
        ExecutionOutcome::Rows(QueryResult::new(
            vec!["STATUS".into()],
            vec![vec!["FREE".into()]],
        ))
    }

    #[tokio::test]
    async fn test_placeholder_is_fixed_text() {
        let text = PlaceholderDescriber::default()
            .describe("anything", &outcome())
            .await;
        assert_eq!(text, "good");
    }

    #[tokio::test]
    async fn test_llm_text_is_unquoted() {
        let text = describer(Reply::Text("\"The cradle is free.\""))
            .describe("status of cradle 5", &outcome())
            .await;
        assert_eq!(text, "The cradle is free.");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_placeholder() {
        let text = describer(Reply::Fail).describe("status", &outcome()).await;
        assert_eq!(text, "good");
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_placeholder() {
        let text = describer(Reply::Hang).describe("status", &outcome()).await;
        assert_eq!(text, "good");
    }

    #[tokio::test]
    async fn test_blank_reply_falls_back_to_placeholder() {
        let text = describer(Reply::Text("  \"\" ")).describe("status", &outcome()).await;
        assert_eq!(text, "good");
    }
}
