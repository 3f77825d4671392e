//! Deskpilot Web Server
//!
//! Serves grounded reply drafting over HTTP.

use clap::Parser;
use deskpilot_web::server::DeskpilotServerBuilder;
use deskpilot_web::{init_logging, WebConfig};

/// Deskpilot Web Server - drafts support replies grounded in the knowledge base
#[derive(Parser)]
#[command(name = "deskpilot-web")]
#[command(about = "HTTP server for Deskpilot reply drafting")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database URL
    #[arg(long)]
    database_url: Option<String>,

    /// Engine configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Command line arguments override the environment
    let mut config = WebConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.database_url.is_some() {
        config.database_url = args.database_url;
    }
    if args.config.is_some() {
        config.config_path = args.config;
    }

    let mut app_config = match config.load_app_config() {
        Ok(app_config) => app_config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(level) = args.log_level {
        app_config.logging = app_config.logging.with_level(&level);
    }

    if let Err(e) = init_logging(&app_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if app_config.llm.resolve_api_key().is_none() && app_config.llm.provider != "ollama" {
        tracing::warn!(
            provider = %app_config.llm.provider,
            env_var = app_config.llm.api_key_env_var().unwrap_or(""),
            "No API key configured; generation requests will fail"
        );
    }

    let server = match DeskpilotServerBuilder::with_config(config)
        .app_config(app_config)
        .build()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        tracing::error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
