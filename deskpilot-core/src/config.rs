//! Configuration management

use crate::error::{DeskError, DeskResult, ErrorContext};
use crate::logging::LoggingConfig;
use crate::types::GenerationConfig;
use crate::{config_error, validation_error};
use serde::{Deserialize, Serialize};

use std::path::Path;

/// Top-level configuration for the response generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskpilotConfig {
    /// Overall deadline for one generate call, in milliseconds
    pub generation_timeout_ms: u64,
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
    pub logging: LoggingConfig,
}

/// Completion provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider type (openai, anthropic, ollama, groq)
    pub provider: String,
    /// API key (optional, falls back to the provider's environment variable)
    pub api_key: Option<String>,
    /// Base URL for custom endpoints
    pub base_url: Option<String>,
}

/// What to do when loading ticket history fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFailurePolicy {
    /// Log and continue with the messages already in the request
    #[default]
    Degrade,
    /// Fail the generate call
    Propagate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum number of articles kept from a successful search strategy
    pub max_articles: usize,
    pub history_failure_policy: HistoryFailurePolicy,
}

impl Default for DeskpilotConfig {
    fn default() -> Self {
        Self {
            generation_timeout_ms: 60_000,
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: None,
            base_url: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_articles: 5,
            history_failure_policy: HistoryFailurePolicy::Degrade,
        }
    }
}

impl LlmConfig {
    /// Environment variable holding the API key for this provider
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self.provider.as_str() {
            "openai" => Some("OPENAI_API_KEY"),
            "anthropic" => Some("ANTHROPIC_API_KEY"),
            "groq" => Some("GROQ_API_KEY"),
            _ => None,
        }
    }

    /// The configured key, or the one found in the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.api_key_env_var()
                .and_then(|var| std::env::var(var).ok())
        })
    }
}

impl DeskpilotConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DeskResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DeskError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> DeskResult<Self> {
        let config: DeskpilotConfig = toml::from_str(content).map_err(|e| DeskError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DeskResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| DeskError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| DeskError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> DeskResult<()> {
        let generation = &self.generation;

        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(validation_error!(
                "Temperature must be between 0.0 and 2.0",
                "generation.temperature",
                "config"
            ));
        }

        if generation.max_tokens == 0 {
            return Err(validation_error!(
                "max_tokens must be greater than 0",
                "generation.max_tokens",
                "config"
            ));
        }

        if generation.model_name.trim().is_empty() {
            return Err(validation_error!(
                "model_name must not be empty",
                "generation.model_name",
                "config"
            ));
        }

        if generation.max_context_length == 0 {
            return Err(validation_error!(
                "max_context_length must be greater than 0",
                "generation.max_context_length",
                "config"
            ));
        }

        if self.retrieval.max_articles == 0 {
            return Err(validation_error!(
                "max_articles must be greater than 0",
                "retrieval.max_articles",
                "config"
            ));
        }

        if self.generation_timeout_ms == 0 {
            return Err(config_error!(
                "generation_timeout_ms must be greater than 0",
                "config"
            ));
        }

        Ok(())
    }
}
