//! Service configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML file
//! (`control.toml`, or the path in `CONTROL_CONFIG`), then `CONTROL_*`
//! environment variables using `__` between nested keys, e.g.
//! `CONTROL_SESSION__BACKEND=redis`.

use std::net::SocketAddr;

use common::{
    cache::RedisConfig,
    database::DatabaseConfig,
    error::DatabaseResult,
};
use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "control.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    /// Falls back to `DATABASE_*` environment variables when absent
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Used when `RUST_LOG` is unset
    pub level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub cookie_name: String,
    /// Idle time after which a session is discarded
    pub ttl_seconds: u64,
    pub prune_interval_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub backend: CredentialBackend,
    /// Users loaded into the memory backend, or upserted into PostgreSQL
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub user_id: String,
    pub user_name: Option<String>,
    pub password: String,
}

impl AppConfig {
    /// Load from `CONTROL_CONFIG` or [`DEFAULT_CONFIG_PATH`]
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("CONTROL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load from the given file (which may be missing) and the environment
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        Self::finish(
            Self::builder()?
                .add_source(File::with_name(config_path).required(false))
                .add_source(
                    Environment::with_prefix("CONTROL")
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn finish(builder: config::ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.ttl_seconds == 0 {
            return Err(ConfigError::Message(
                "session.ttl_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured database section, or one read from the environment
    pub fn database_config(&self) -> DatabaseResult<DatabaseConfig> {
        match &self.database {
            Some(database) => Ok(database.clone()),
            None => DatabaseConfig::from_env(),
        }
    }

    fn builder() -> Result<config::ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("session.backend", "memory")?
            .set_default("session.cookie_name", "SESSIONID")?
            .set_default("session.ttl_seconds", 1800)?
            .set_default("session.prune_interval_seconds", 60)?
            .set_default("credentials.backend", "memory")
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
