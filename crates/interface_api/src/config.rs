//! API configuration

use serde::Deserialize;

/// Server settings, loaded from `API_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "defaults::host")]
    pub host: String,
    #[serde(default = "defaults::port")]
    pub port: u16,
    #[serde(default = "defaults::database_url")]
    pub database_url: String,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

mod defaults {
    pub fn host() -> String {
        "0.0.0.0".to_string()
    }

    pub fn port() -> u16 {
        8080
    }

    pub fn database_url() -> String {
        "postgres://localhost/school".to_string()
    }

    pub fn log_level() -> String {
        "info".to_string()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            database_url: defaults::database_url(),
            log_level: defaults::log_level(),
        }
    }
}

impl ApiConfig {
    /// Loads settings from the environment (`API_HOST`, `API_PORT`, ...)
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Like [`from_env`](Self::from_env) but falls back to the unprefixed
    /// conventions (`DATABASE_URL`, `RUST_LOG`) and finally to defaults
    pub fn load() -> Self {
        Self::from_env().unwrap_or_else(|_| Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| defaults::host()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(defaults::port),
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("API_DATABASE_URL"))
                .unwrap_or_else(|_| defaults::database_url()),
            log_level: std::env::var("API_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| defaults::log_level()),
        })
    }

    /// The host:port pair the listener binds to
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
