//! # Config Module
//!
//! Connection settings for the data sources corm talks to. A configuration
//! names any number of connections plus an optional default one, and can be
//! read from JSON or from environment variables (a `.env` file is honoured).

use std::{collections::HashMap, env, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialect::DialectKind;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("environment variable `{0}` is not set")]
    MissingVariable(String),

    #[error("environment variable `{name}` has invalid value `{value}`")]
    InvalidVariable { name: String, value: String },

    #[error("unknown dialect `{0}`")]
    UnknownDialect(String),

    #[error("no connection named `{0}` is configured")]
    UnknownConnection(String),

    #[error("no default connection is configured")]
    NoDefaultConnection,
}

/// Settings of one logical database connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub dialect: DialectKind,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// Database (schema) name; the file path for SQLite.
    pub database: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
    /// Upper bound of the connection pool, when the driver pools.
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl DataSourceConfig {
    /// Builds the sqlx connection URL for these settings.
    pub fn connection_url(&self) -> String {
        if self.dialect == DialectKind::Sqlite {
            return if self.database == ":memory:" {
                "sqlite::memory:".to_string()
            } else {
                format!("sqlite://{}?mode=rwc", self.database)
            };
        }

        // Credentials and the database name are percent-encoded.
        let mut url = format!("{}://", self.dialect.scheme());
        if !self.login.is_empty() {
            url.push_str(&urlencoding::encode(&self.login));
            if !self.password.is_empty() {
                url.push(':');
                url.push_str(&urlencoding::encode(&self.password));
            }
            url.push('@');
        }
        url.push_str(if self.host.is_empty() { "localhost" } else { &self.host });
        if let Some(port) = self.port {
            url.push_str(&format!(":{}", port));
        }
        url.push('/');
        url.push_str(&urlencoding::encode(&self.database));
        url
    }

    /// Reads `{PREFIX}_DIALECT`, `_HOST`, `_PORT`, `_DATABASE`, `_LOGIN`,
    /// `_PASSWORD` and `_MAX_CONNECTIONS`. Only the dialect and database are
    /// required.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let dialect = required(prefix, "DIALECT")?.parse()?;
        let database = required(prefix, "DATABASE")?;
        let port = optional(prefix, "PORT").map(|value| parse_var(prefix, "PORT", value)).transpose()?;
        let max_connections = optional(prefix, "MAX_CONNECTIONS")
            .map(|value| parse_var(prefix, "MAX_CONNECTIONS", value))
            .transpose()?;

        Ok(Self {
            dialect,
            host: optional(prefix, "HOST").unwrap_or_default(),
            port,
            database,
            login: optional(prefix, "LOGIN").unwrap_or_default(),
            password: optional(prefix, "PASSWORD").unwrap_or_default(),
            max_connections,
        })
    }
}

fn var_name(prefix: &str, key: &str) -> String {
    format!("{}_{}", prefix, key)
}

fn optional(prefix: &str, key: &str) -> Option<String> {
    env::var(var_name(prefix, key)).ok().filter(|value| !value.trim().is_empty())
}

fn required(prefix: &str, key: &str) -> Result<String, ConfigError> {
    optional(prefix, key).ok_or_else(|| ConfigError::MissingVariable(var_name(prefix, key)))
}

fn parse_var<T: std::str::FromStr>(prefix: &str, key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVariable { name: var_name(prefix, key), value })
}

/// A set of named connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CormConfig {
    #[serde(default)]
    pub default_connection: Option<String>,
    #[serde(default)]
    pub connections: HashMap<String, DataSourceConfig>,
}

impl CormConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn connection(&self, id: &str) -> Result<&DataSourceConfig, ConfigError> {
        self.connections.get(id).ok_or_else(|| ConfigError::UnknownConnection(id.to_string()))
    }

    pub fn default_connection(&self) -> Result<&DataSourceConfig, ConfigError> {
        let id = self.default_connection.as_deref().ok_or(ConfigError::NoDefaultConnection)?;
        self.connection(id)
    }
}
