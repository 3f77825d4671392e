//! Deskpilot Web Server
//!
//! HTTP boundary for the response generation engine, backed by SQLite stores.

pub mod database;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use database::{Database, SqliteKnowledgeStore, SqliteTicketHistory};
pub use server::DeskpilotServer;
pub use state::AppState;

use axum::{extract::DefaultBodyLimit, Router};
use deskpilot_core::DeskpilotConfig;
use tower_http::trace::TraceLayer;

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// SQLite URL; an in-memory database when unset
    pub database_url: Option<String>,
    /// TOML file with the engine configuration
    pub config_path: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: None,
            config_path: None,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset or unparseable values
    /// fall back to the defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup("DESKPILOT_HOST").unwrap_or(defaults.host),
            port: lookup("DESKPILOT_PORT")
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
            database_url: lookup("DATABASE_URL"),
            config_path: lookup("DESKPILOT_CONFIG"),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }

    /// Engine configuration from `config_path`, or the defaults
    pub fn load_app_config(&self) -> WebResult<DeskpilotConfig> {
        match &self.config_path {
            Some(path) => DeskpilotConfig::from_file(path)
                .map_err(|e| WebError::Config(format!("{}: {}", path, e))),
            None => Ok(DeskpilotConfig::default()),
        }
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

/// Initialize logging from the engine configuration, adding HTTP tracing output
pub fn init_logging(config: &DeskpilotConfig) -> WebResult<()> {
    let mut logging = config.logging.clone();
    logging
        .filter_directives
        .push("tower_http=debug".to_string());

    deskpilot_core::init_logging(&logging).map_err(|e| WebError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults_when_env_unset() {
        let config = WebConfig::from_lookup(|_| None);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_config_from_variables() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DESKPILOT_HOST", "0.0.0.0"),
            ("DESKPILOT_PORT", "9000"),
            ("DATABASE_URL", "sqlite://desk.db"),
            ("DESKPILOT_CONFIG", "deskpilot.toml"),
        ]);
        let config = WebConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.address(), "0.0.0.0:9000");
        assert_eq!(config.database_url(), "sqlite://desk.db");
        assert_eq!(config.config_path.as_deref(), Some("deskpilot.toml"));
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config = WebConfig::from_lookup(|key| {
            (key == "DESKPILOT_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let config = WebConfig {
            config_path: Some("/nonexistent/deskpilot.toml".to_string()),
            ..WebConfig::default()
        };
        assert!(matches!(
            config.load_app_config(),
            Err(WebError::Config(_))
        ));
    }
}
