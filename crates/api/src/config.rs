//! Configuration loaded from environment variables

use std::env;
use std::path::PathBuf;

use chirpy_shared::DEFAULT_MAX_CONNECTIONS;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Deployment platform. Only `dev` unlocks destructive admin operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform(String);

impl Platform {
    pub fn is_dev(&self) -> bool {
        self.0 == "dev"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Platform {
    fn from(value: &str) -> Self {
        Self(value.trim().to_ascii_lowercase())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub jwt_secret: String,
    pub platform: Platform,
    /// API key expected on Polka webhooks; empty rejects every webhook
    pub polka_key: String,
    pub bind_address: String,
    pub fileserver_root: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = first_of(&["DATABASE_URL", "DB_URL"])
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret =
            first_of(&["SECRET", "JWT_SECRET"]).ok_or(ConfigError::Missing("SECRET"))?;

        let db_max_connections = match non_empty("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                name: "DB_MAX_CONNECTIONS",
                reason: format!("{e}"),
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let run_migrations = match non_empty("RUN_MIGRATIONS") {
            Some(raw) => parse_bool("RUN_MIGRATIONS", &raw)?,
            None => true,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            run_migrations,
            jwt_secret,
            platform: Platform::from(env::var("PLATFORM").unwrap_or_default().as_str()),
            polka_key: env::var("POLKA_KEY").unwrap_or_default(),
            bind_address: non_empty("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".into()),
            fileserver_root: non_empty("FILESERVER_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

#[cfg(test)]
impl Config {
    /// Config for router tests; never touches the environment
    pub(crate) fn for_tests(platform: &str, polka_key: &str) -> Self {
        Self {
            database_url: "postgres://unused".to_string(),
            db_max_connections: 1,
            run_migrations: false,
            jwt_secret: "router-test-secret".to_string(),
            platform: Platform::from(platform),
            polka_key: polka_key.to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            fileserver_root: PathBuf::from("."),
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn first_of(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| non_empty(name))
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}
