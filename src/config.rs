//! Application configuration loaded from environment variables.

use serde::Deserialize;
use url::Url;

/// Replacement for secrets in logged connection strings.
const REDACTED: &str = "****";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Database ===
    /// PostgreSQL connection string.
    pub database_url: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    /// Liveness probes attempted before giving up at startup.
    #[serde(default = "default_connect_attempts")]
    pub db_connect_attempts: u32,

    /// Delay between liveness probes in milliseconds.
    #[serde(default = "default_connect_interval_ms")]
    pub db_connect_interval_ms: u64,

    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow cross-origin requests from any origin.
    #[serde(default = "default_true")]
    pub cors_permissive: bool,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_attempts() -> u32 {
    30
}

fn default_connect_interval_ms() -> u64 {
    1000
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("DATABASE_URL is required".to_string());
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err("DATABASE_URL must be a postgres:// connection string".to_string());
        }

        if self.db_max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be at least 1".to_string());
        }

        if self.db_connect_attempts == 0 {
            return Err("DB_CONNECT_ATTEMPTS must be at least 1".to_string());
        }

        Ok(())
    }

    /// Database URL with the password masked, for logging.
    ///
    /// Masks both the userinfo password and a `password` query parameter.
    pub fn redacted_database_url(&self) -> String {
        let Ok(mut url) = Url::parse(&self.database_url) else {
            return "<invalid>".to_string();
        };

        if url.password().is_some() && url.set_password(Some(REDACTED)).is_err() {
            return "<invalid>".to_string();
        }

        if url.query_pairs().any(|(key, _)| is_secret_param(&key)) {
            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(key, value)| {
                    let value = if is_secret_param(&key) {
                        REDACTED.to_string()
                    } else {
                        value.into_owned()
                    };
                    (key.into_owned(), value)
                })
                .collect();
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }

        url.to_string()
    }
}

fn is_secret_param(key: &str) -> bool {
    key.eq_ignore_ascii_case("password")
}
