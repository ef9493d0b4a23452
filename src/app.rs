use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::domain::error::Result;
use crate::infrastructure::bootstrap::build_state;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::start_server;

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn run() -> Result<()> {
    // A missing .env is normal outside development.
    let _ = dotenvy::dotenv();

    let config = AppConfig::load()?;
    init_tracing(&config.log_filter);
    info!(
        schema = %config.schema_path.display(),
        "Starting nl2sql"
    );

    let state = build_state(&config).await?;
    let server = start_server(state, &config.server)?;
    server.await?;

    info!("Server stopped");
    Ok(())
}
