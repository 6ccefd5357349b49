use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3002
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Ok(layered()?.try_deserialize()?)
    }
}

/// Builds the layered settings shared by every service.
///
/// Sources, lowest precedence first: `.env` (via dotenvy), an optional
/// `configuration.{toml,yaml,json}` in the working directory, then `APP__*`
/// environment variables (`APP__MONGODB__URI` maps to `mongodb.uri`).
pub fn layered() -> Result<Cfg, AppError> {
    dotenvy::dotenv().ok();

    let config = Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;

    Ok(config)
}
