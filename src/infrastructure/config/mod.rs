//! Service configuration.
//!
//! Layers, lowest precedence first: built-in defaults, the TOML file
//! (`nl2sql.toml`, or the path in `NL2SQL_CONFIG`), then `NL2SQL_*`
//! environment variables with nested keys split on `__`
//! (`NL2SQL_SERVER__PORT=9000`, `NL2SQL_GENERATOR__API_KEY=...`).

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use crate::infrastructure::db::DbExecutorConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "nl2sql.toml";
pub const ENV_PREFIX: &str = "NL2SQL_";
pub const ENV_CONFIG_PATH: &str = "NL2SQL_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin; any origin when unset.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `postgres://...`, `postgresql://...` or `sqlite:...`
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub query_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let pool = DbExecutorConfig::default();
        Self {
            url: String::new(),
            max_connections: pool.max_connections,
            connect_timeout_secs: pool.connect_timeout_secs,
            query_timeout_secs: pool.query_timeout_secs,
        }
    }
}

impl DatabaseConfig {
    pub fn executor_config(&self) -> DbExecutorConfig {
        DbExecutorConfig {
            max_connections: self.max_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            query_timeout_secs: self.query_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub provider: LLMProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Query language named in the generator instruction.
    pub dialect: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let llm = LLMConfig::default();
        Self {
            provider: llm.provider,
            base_url: llm.base_url,
            model: llm.model,
            api_key: llm.api_key,
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            dialect: "SQL".to_string(),
            timeout_secs: 60,
        }
    }
}

impl GeneratorConfig {
    pub fn llm_config(&self) -> LLMConfig {
        LLMConfig {
            provider: self.provider,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionMode {
    Placeholder,
    Llm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionConfig {
    pub mode: DescriptionMode,
    pub placeholder: String,
    pub timeout_secs: u64,
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            mode: DescriptionMode::Placeholder,
            placeholder: "good".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub generator: GeneratorConfig,
    pub description: DescriptionConfig,
    /// JSON schema file describing the queryable tables.
    pub schema_path: PathBuf,
    /// Default `tracing` filter; `RUST_LOG` wins when set.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            generator: GeneratorConfig::default(),
            description: DescriptionConfig::default(),
            schema_path: PathBuf::from("schema.json"),
            log_filter: "info,sqlx=warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults merged with the given TOML file (if present) and the environment.
    pub fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_figment(Self::figment(&path))
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::ConfigError(
                "database.url is not set (NL2SQL_DATABASE__URL)".to_string(),
            ));
        }
        if self.schema_path.as_os_str().is_empty() {
            return Err(AppError::ConfigError("schema_path is empty".to_string()));
        }
        if self.generator.base_url.trim().is_empty() {
            return Err(AppError::ConfigError(
                "generator.base_url is empty".to_string(),
            ));
        }
        if self.generator.timeout_secs == 0 || self.database.query_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_toml(toml: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml))
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = AppConfig::from_figment(with_toml(
            r#"
            schema_path = "fixtures/harbour.json"

            [server]
            port = 9000
            cors_origin = "http://localhost:3000"

            [database]
            url = "sqlite::memory:"
            query_timeout_secs = 5

            [generator]
            provider = "seq2seq"
            base_url = "http://tgi:8080"
            dialect = "PostgreSQL"

            [description]
            mode = "llm"
            "#,
        ))
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.cors_origin.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.database.query_timeout_secs, 5);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.generator.provider, LLMProvider::Seq2Seq);
        assert_eq!(config.generator.dialect, "PostgreSQL");
        assert_eq!(config.generator.model, "local-model");
        assert_eq!(config.description.mode, DescriptionMode::Llm);
        assert_eq!(config.description.placeholder, "good");
        assert_eq!(config.schema_path, PathBuf::from("fixtures/harbour.json"));
    }

    #[test]
    fn test_missing_database_url_is_rejected() {
        let err = AppConfig::from_figment(with_toml("")).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(msg) if msg.contains("database.url")));
    }

    #[test]
    fn test_bad_provider_is_config_error() {
        let result = AppConfig::from_figment(with_toml(
            r#"
            [database]
            url = "sqlite::memory:"
            [generator]
            provider = "carrier-pigeon"
            "#,
        ));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_blank_api_key_is_dropped() {
        let generator = GeneratorConfig {
            api_key: Some("  ".to_string()),
            ..GeneratorConfig::default()
        };
        assert!(generator.llm_config().api_key.is_none());
    }

    #[test]
    fn test_executor_config_mirrors_database_section() {
        let database = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 2,
            connect_timeout_secs: 3,
            query_timeout_secs: 4,
        };
        let pool = database.executor_config();
        assert_eq!(pool.max_connections, 2);
        assert_eq!(pool.connect_timeout_secs, 3);
        assert_eq!(pool.query_timeout_secs, 4);
    }
}
