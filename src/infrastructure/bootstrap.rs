use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::application::{
    DescriptionGenerator, LlmDescriber, LlmQueryGenerator, NlQueryUseCase, PlaceholderDescriber,
};
use crate::domain::error::Result;
use crate::infrastructure::config::{AppConfig, DescriptionMode};
use crate::infrastructure::db::SqlxQueryExecutor;
use crate::infrastructure::llm_clients::{LLMClient, RouterClient};
use crate::infrastructure::schema_loader::load_schema;
use crate::interfaces::http::AppState;

/// Load the schema, open the pool and wire the pipeline. Any error aborts startup.
pub async fn build_state(config: &AppConfig) -> Result<Arc<AppState>> {
    let schema = Arc::new(load_schema(&config.schema_path)?);

    let executor =
        SqlxQueryExecutor::connect(&config.database.url, config.database.executor_config())
            .await?;
    info!(driver = executor.driver_name(), "Database ready");

    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(RouterClient::new());
    let generator = LlmQueryGenerator::new(
        llm_client.clone(),
        config.generator.llm_config(),
        config.generator.dialect.clone(),
    );
    info!(
        provider = ?config.generator.provider,
        base_url = %config.generator.base_url,
        model = %config.generator.model,
        "Query generator configured"
    );

    let nl_query = NlQueryUseCase::new(
        schema,
        Arc::new(generator),
        Arc::new(executor),
        build_describer(config, llm_client),
    )
    .with_generation_timeout(Duration::from_secs(config.generator.timeout_secs));

    Ok(Arc::new(AppState { nl_query }))
}

pub fn build_describer(
    config: &AppConfig,
    llm_client: Arc<dyn LLMClient + Send + Sync>,
) -> Arc<dyn DescriptionGenerator + Send + Sync> {
    let placeholder = PlaceholderDescriber::new(config.description.placeholder.clone());
    match config.description.mode {
        DescriptionMode::Placeholder => Arc::new(placeholder),
        DescriptionMode::Llm => {
            info!("LLM result descriptions enabled");
            Arc::new(LlmDescriber::new(
                llm_client,
                config.generator.llm_config(),
                Duration::from_secs(config.description.timeout_secs),
                placeholder,
            ))
        }
    }
}
