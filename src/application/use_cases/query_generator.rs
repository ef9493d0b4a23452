use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use crate::domain::schema::RelevantSchemaContext;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::extract_sql;
use async_trait::async_trait;
use std::sync::Arc;

/// Turns a prompt plus schema context into query text. The output is untrusted.
#[async_trait]
pub trait QueryGenerator {
    async fn generate(&self, prompt: &str, context: &RelevantSchemaContext) -> Result<String>;
}

pub fn build_instruction(dialect: &str, prompt: &str, context: &RelevantSchemaContext) -> String {
    format!(
        "Generate {} query for the prompt based on the prompt and context.{} Context: {}",
        dialect,
        prompt,
        context.to_json()
    )
}

pub struct LlmQueryGenerator {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    config: LLMConfig,
    dialect: String,
}

impl LlmQueryGenerator {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        config: LLMConfig,
        dialect: impl Into<String>,
    ) -> Self {
        Self {
            llm_client,
            config,
            dialect: dialect.into(),
        }
    }

    /// Seq2seq text-to-SQL models are trained on the bare instruction.
    fn system_prompt(&self) -> String {
        match self.config.provider {
            LLMProvider::Seq2Seq => String::new(),
            LLMProvider::OpenAI => format!(
                "You translate questions about a relational database into {}. Use only the tables and columns in the context. Return ONLY the query, without explanations or Markdown.",
                self.dialect
            ),
        }
    }
}

#[async_trait]
impl QueryGenerator for LlmQueryGenerator {
    async fn generate(&self, prompt: &str, context: &RelevantSchemaContext) -> Result<String> {
        let user_prompt = build_instruction(&self.dialect, prompt, context);

        let raw = self
            .llm_client
            .generate(&self.config, &self.system_prompt(), &user_prompt)
            .await?;

        let sql = extract_sql(&raw);
        if sql.is_empty() {
            return Err(AppError::LLMError(
                "Generator returned an empty query".to_string(),
            ));
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{Schema, TableSpec};
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: String,
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl LLMClient for ScriptedClient {
        async fn generate(&self, _config: &LLMConfig, system: &str, user: &str) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            Ok(self.reply.clone())
        }
    }

    fn context() -> RelevantSchemaContext {
        let schema = Schema::default().with_table("cradles", TableSpec::new(&["ID", "STATUS"]));
        RelevantSchemaContext::from_table_names(&schema, ["cradles"])
    }

    #[test]
    fn test_instruction_framing() {
        let text = build_instruction("SQL", "count cradles", &context());
        assert!(text.starts_with(
            "Generate SQL query for the prompt based on the prompt and context.count cradles Context: {"
        ));
        assert!(text.contains("\"cradles\""));
    }

    #[tokio::test]
    async fn test_generate_extracts_fenced_sql() {
        let client = Arc::new(ScriptedClient {
            reply: "<think>cradles table</think>```sql\nSELECT COUNT(*) FROM cradles;\n```".into(),
            seen: Mutex::new(Vec::new()),
        });
        let generator = LlmQueryGenerator::new(client.clone(), LLMConfig::default(), "SQL");

        let sql = generator.generate("count cradles", &context()).await.unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM cradles;");

        let seen = client.seen.lock().unwrap();
        assert!(seen[0].0.contains("Return ONLY the query"));
        assert!(seen[0].1.contains("count cradles"));
    }

    #[tokio::test]
    async fn test_seq2seq_gets_no_system_prompt() {
        let client = Arc::new(ScriptedClient {
            reply: "SELECT STATUS FROM cradles".into(),
            seen: Mutex::new(Vec::new()),
        });
        let config = LLMConfig {
            provider: LLMProvider::Seq2Seq,
            ..LLMConfig::default()
        };
        let generator = LlmQueryGenerator::new(client.clone(), config, "SQL");

        generator.generate("cradle status", &context()).await.unwrap();
        assert!(client.seen.lock().unwrap()[0].0.is_empty());
    }

    #[tokio::test]
    async fn test_blank_reply_is_generation_error() {
        let client = Arc::new(ScriptedClient {
            reply: "<think>no idea</think>".into(),
            seen: Mutex::new(Vec::new()),
        });
        let generator = LlmQueryGenerator::new(client, LLMConfig::default(), "SQL");

        let err = generator.generate("??", &context()).await.unwrap_err();
        assert!(matches!(err, AppError::LLMError(_)));
    }
}
