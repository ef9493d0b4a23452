//! Prompt -> query -> rendered result pipeline.

use crate::application::use_cases::description::DescriptionGenerator;
use crate::application::use_cases::query_generator::QueryGenerator;
use crate::application::use_cases::relevance_resolver::RelevanceResolver;
use crate::application::use_cases::render_classifier::classify;
use crate::application::use_cases::schema_index::LexicalIndex;
use crate::domain::error::{AppError, Result};
use crate::domain::query_result::{ExecutionOutcome, GeneratedQuery, RenderedResponse, RenderingType};
use crate::domain::schema::{RelevantSchemaContext, Schema};
use crate::infrastructure::db::QueryExecutor;
use crate::infrastructure::response::strip_statement_terminator;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const EMPTY_PROMPT_MESSAGE: &str = "Prompt cannot be empty.";

pub struct NlQueryUseCase {
    schema: Arc<Schema>,
    index: Arc<LexicalIndex>,
    resolver: RelevanceResolver,
    generator: Arc<dyn QueryGenerator + Send + Sync>,
    executor: Arc<dyn QueryExecutor + Send + Sync>,
    describer: Arc<dyn DescriptionGenerator + Send + Sync>,
    generation_timeout: Duration,
}

impl NlQueryUseCase {
    pub fn new(
        schema: Arc<Schema>,
        generator: Arc<dyn QueryGenerator + Send + Sync>,
        executor: Arc<dyn QueryExecutor + Send + Sync>,
        describer: Arc<dyn DescriptionGenerator + Send + Sync>,
    ) -> Self {
        let index = Arc::new(LexicalIndex::build(&schema));
        Self {
            schema,
            index,
            resolver: RelevanceResolver::default(),
            generator,
            executor,
            describer,
            generation_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn check_prompt(prompt: &str) -> Result<()> {
        if prompt.trim().is_empty() {
            return Err(AppError::ValidationError(EMPTY_PROMPT_MESSAGE.to_string()));
        }
        Ok(())
    }

    /// Relevant tables for the prompt, or the whole schema when nothing matched.
    pub fn context_for(&self, prompt: &str) -> RelevantSchemaContext {
        let context = self.resolver.resolve(prompt, &self.schema, &self.index);
        if context.is_empty() {
            info!("No schema match for prompt, using full schema");
            self.schema.full_context()
        } else {
            context
        }
    }

    async fn generate(&self, prompt: &str, context: &RelevantSchemaContext) -> Result<String> {
        let started = Instant::now();
        let generated = tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(prompt, context),
        )
        .await
        .map_err(|_| {
            AppError::LLMError(format!(
                "timed out after {} seconds",
                self.generation_timeout.as_secs()
            ))
        })??;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            tables = context.len(),
            "Query generated"
        );
        Ok(generated)
    }

    /// Generate a query against the full schema without running it.
    pub async fn generate_only(&self, prompt: &str) -> Result<GeneratedQuery> {
        Self::check_prompt(prompt)?;
        let prompt = prompt.trim();
        let context = self.schema.full_context();
        let generated_query = self.generate(prompt, &context).await?;

        Ok(GeneratedQuery {
            prompt: prompt.to_string(),
            generated_query,
        })
    }

    pub async fn generate_and_execute(&self, prompt: &str) -> Result<RenderedResponse> {
        Self::check_prompt(prompt)?;
        let prompt = prompt.trim();

        let context = self.context_for(prompt);
        debug!(tables = ?context.table_names(), "Schema context for generation");

        let generated = self.generate(prompt, &context).await?;
        let sql = strip_statement_terminator(&generated).to_string();
        if sql.is_empty() {
            return Err(AppError::LLMError(
                "Generator returned an empty query".to_string(),
            ));
        }

        let started = Instant::now();
        let outcome = self.executor.execute(&sql).await?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query executed"
        );

        let (execution_result, rendering_type) = match outcome {
            ExecutionOutcome::Rows(result) => {
                let classified = classify(result);
                (
                    ExecutionOutcome::Rows(classified.result),
                    classified.rendering_type,
                )
            }
            ack @ ExecutionOutcome::Acknowledged { .. } => (ack, RenderingType::Text),
        };
        debug!(rendering_type = ?rendering_type, "Result classified");

        let description = self.describer.describe(prompt, &execution_result).await;

        Ok(RenderedResponse {
            prompt: prompt.to_string(),
            generated_query: sql,
            execution_result,
            rendering_type,
            description,
        })
    }
}
