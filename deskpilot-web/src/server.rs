//! Deskpilot Web Server
//!
//! Server bootstrap using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use deskpilot_core::DeskpilotConfig;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main Deskpilot web server
pub struct DeskpilotServer {
    config: WebConfig,
    state: AppState,
}

impl DeskpilotServer {
    pub async fn new(config: WebConfig, app_config: DeskpilotConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone(), app_config).await?;

        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting Deskpilot web server");
        info!("Database: {}", self.config.database_url());

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Builder for DeskpilotServer
pub struct DeskpilotServerBuilder {
    config: WebConfig,
    app_config: DeskpilotConfig,
}

impl DeskpilotServerBuilder {
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
            app_config: DeskpilotConfig::default(),
        }
    }

    /// Start from an existing web configuration
    pub fn with_config(config: WebConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database_url = Some(database_url.into());
        self
    }

    pub fn app_config(mut self, app_config: DeskpilotConfig) -> Self {
        self.app_config = app_config;
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<DeskpilotServer> {
        DeskpilotServer::new(self.config, self.app_config).await
    }
}

impl Default for DeskpilotServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
