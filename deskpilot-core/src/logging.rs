//! Unified logging system
//!
//! Structured `tracing` output with configurable format and filters

use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Whether to include thread information
    pub include_thread: bool,
    /// Whether to log span close events with their timings
    pub enable_performance_monitoring: bool,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            enable_performance_monitoring: false,
            filter_directives: vec![
                "deskpilot_core=info".to_string(),
                "deskpilot_rag=info".to_string(),
                "deskpilot_web=info".to_string(),
            ],
        }
    }
}

impl LoggingConfig {
    /// Override the level, including the per-crate `deskpilot_*` directives
    /// that would otherwise pin the workspace crates to their old level
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        for directive in &mut self.filter_directives {
            if let Some((target, _)) = directive.split_once('=') {
                if target.starts_with("deskpilot_") {
                    *directive = format!("{}={}", target, level);
                }
            }
        }
        self
    }
}

type LoggingResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn add_directives(mut filter: EnvFilter, config: &LoggingConfig) -> LoggingResult<EnvFilter> {
    for directive in &config.filter_directives {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

/// Filter built from the configured level and directives only, ignoring `RUST_LOG`
pub fn config_filter(config: &LoggingConfig) -> LoggingResult<EnvFilter> {
    add_directives(EnvFilter::new(&config.level), config)
}

/// Initialize the logging system
pub fn init_logging(config: &LoggingConfig) -> LoggingResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => add_directives(env_filter, config)?,
        Err(_) => config_filter(config)?,
    };

    let span_events = if config.enable_performance_monitoring {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_span_events(span_events)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread)
                .with_writer(io::stdout);
            registry.with(fmt_layer).try_init()?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_span_events(span_events)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread)
                .with_writer(io::stdout);
            registry.with(fmt_layer).try_init()?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_span_events(span_events)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread)
                .with_writer(io::stdout);
            registry.with(fmt_layer).try_init()?;
        }
    }

    Ok(())
}

/// Performance monitoring utilities
pub mod performance {
    use std::time::Instant;
    use tracing::{info_span, Instrument};

    /// Measure and log execution time of an async operation
    pub async fn measure_async<F, T>(operation_name: &str, future: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let span = info_span!("performance", operation = operation_name);
        let start = Instant::now();

        let result = future.instrument(span).await;

        tracing::debug!(
            target: "performance",
            operation = operation_name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Operation completed"
        );

        result
    }
}

/// Logging macros for common patterns
#[macro_export]
macro_rules! log_operation_start {
    ($operation:expr) => {
        tracing::info!(
            operation = $operation,
            "Starting operation"
        );
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::info!(
            operation = $operation,
            $($field)*,
            "Starting operation"
        );
    };
}

#[macro_export]
macro_rules! log_operation_success {
    ($operation:expr) => {
        tracing::info!(
            operation = $operation,
            "Operation completed successfully"
        );
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::info!(
            operation = $operation,
            $($field)*,
            "Operation completed successfully"
        );
    };
}
