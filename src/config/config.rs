use std::env;

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::Deserialize;

pub static CONFIG: Lazy<AppConfig> =
    Lazy::new(|| AppConfig::load().unwrap_or_else(|e| panic!("Failed to load config: {}", e)));

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub log_level: String,
    pub server: ServerConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Defaults, then `config/default.toml`, then the environment.
    /// `DATABASE_URL` and `PORT` are read as-is for compatibility with
    /// the usual hosting conventions.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("log_level", "debug")?
            .set_default("server.address", "0.0.0.0")?
            .set_default("server.port", 4000)?
            .set_default("client.api_base", "http://localhost:4000")?
            .set_default("client.timeout_secs", 10)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .set_override_option("database_url", env::var("DATABASE_URL").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?
            .build()?
            .try_deserialize()
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.address, self.server.port)
    }
}
