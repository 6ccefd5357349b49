use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: String,
    pub mongodb: MongoConfig,
    pub store_backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    /// Connection string. Required when `store_backend` is `mongodb`.
    pub uri: Option<String>,
    /// Falls back to the database named in `uri`, then `tasks`.
    pub database: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

impl TaskConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env, configuration file and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let settings = core_config::layered()?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "mongodb".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let uri = resolve_mongo_uri(
            env::var("MONGODB_URI").ok(),
            settings.get_string("mongodb.uri").ok(),
            is_production(&environment),
        );
        let database = env::var("MONGODB_DATABASE")
            .ok()
            .or_else(|| settings.get_string("mongodb.database").ok());

        Ok(TaskConfig {
            common: common_config,
            environment,
            mongodb: MongoConfig { uri, database },
            store_backend,
        })
    }

    /// The connection string, or a configuration error naming where it is
    /// expected to come from.
    pub fn mongo_uri(&self) -> Result<&str, AppError> {
        self.mongodb.uri.as_deref().ok_or_else(|| {
            let hint = if is_production(&self.environment) {
                "MONGODB_URI is required in production but not set"
            } else {
                "MONGODB_URI is not set and configuration has no mongodb.uri"
            };
            AppError::ConfigError(anyhow::anyhow!(hint))
        })
    }
}

pub fn is_production(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

/// The environment wins; outside production the configuration file may
/// supply the connection string instead.
pub fn resolve_mongo_uri(
    from_env: Option<String>,
    from_file: Option<String>,
    is_prod: bool,
) -> Option<String> {
    let non_empty = |uri: &String| !uri.trim().is_empty();
    from_env
        .filter(non_empty)
        .or_else(|| if is_prod { None } else { from_file.filter(non_empty) })
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}
