//! Completion provider integration using siumai
//!
//! The generation invoker sends one assembled prompt to a completion provider
//! and returns the raw text. Provider failures become chain errors; there is
//! no retry and no fallback model.

use crate::prompt::AssembledPrompt;
use crate::types::{RagError, RagResult};
use async_trait::async_trait;
use deskpilot_core::{
    CompletionProvider, CompletionRequest, DeskError, DeskResult, ErrorContext, GenerationConfig,
    LlmConfig,
};
use siumai::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Completion provider backed by a siumai client
pub struct SiumaiCompletionProvider {
    config: LlmConfig,
}

impl SiumaiCompletionProvider {
    pub fn new(config: LlmConfig) -> Self {
        info!("Configured completion provider: {}", config.provider);
        Self { config }
    }

    fn llm_error(&self, message: String, model: &str) -> DeskError {
        DeskError::Llm {
            message,
            provider: Some(self.config.provider.clone()),
            model: Some(model.to_string()),
            context: ErrorContext::new("llm_client").with_operation("complete"),
        }
    }

    fn require_key(&self, request: &CompletionRequest) -> DeskResult<String> {
        request.api_key.clone().ok_or_else(|| {
            self.llm_error(
                format!("{} API key not found", self.config.provider),
                &request.model_name,
            )
        })
    }

    /// Build the siumai client for one request
    async fn build_client(&self, request: &CompletionRequest) -> DeskResult<Box<dyn LlmClient>> {
        let model = request.model_name.as_str();

        match self.config.provider.as_str() {
            "openai" => {
                let api_key = self.require_key(request)?;
                let mut builder = LlmBuilder::new()
                    .openai()
                    .api_key(&api_key)
                    .model(model)
                    .temperature(request.temperature)
                    .max_tokens(request.max_tokens);

                if let Some(base_url) = &self.config.base_url {
                    builder = builder.base_url(base_url);
                }

                let client = builder.build().await.map_err(|e| {
                    self.llm_error(format!("Failed to build OpenAI client: {}", e), model)
                })?;

                Ok(Box::new(client))
            }
            "anthropic" => {
                let api_key = self.require_key(request)?;
                let client = LlmBuilder::new()
                    .anthropic()
                    .api_key(&api_key)
                    .model(model)
                    .temperature(request.temperature)
                    .max_tokens(request.max_tokens)
                    .build()
                    .await
                    .map_err(|e| {
                        self.llm_error(format!("Failed to build Anthropic client: {}", e), model)
                    })?;

                Ok(Box::new(client))
            }
            "ollama" => {
                let base_url = self
                    .config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "http://localhost:11434".to_string());

                let client = LlmBuilder::new()
                    .ollama()
                    .model(model)
                    .base_url(&base_url)
                    .temperature(request.temperature)
                    .max_tokens(request.max_tokens)
                    .build()
                    .await
                    .map_err(|e| {
                        self.llm_error(format!("Failed to build Ollama client: {}", e), model)
                    })?;

                Ok(Box::new(client))
            }
            "groq" => {
                let api_key = self.require_key(request)?;
                let client = LlmBuilder::new()
                    .groq()
                    .api_key(&api_key)
                    .model(model)
                    .temperature(request.temperature)
                    .max_tokens(request.max_tokens)
                    .build()
                    .await
                    .map_err(|e| {
                        self.llm_error(format!("Failed to build Groq client: {}", e), model)
                    })?;

                Ok(Box::new(client))
            }
            provider => Err(DeskError::Config {
                message: format!("Unsupported LLM provider: {}", provider),
                source: None,
                context: ErrorContext::new("llm_client")
                    .with_operation("build_client")
                    .with_suggestion("Use one of: openai, anthropic, ollama, groq"),
            }),
        }
    }
}

#[async_trait]
impl CompletionProvider for SiumaiCompletionProvider {
    fn name(&self) -> &str {
        &self.config.provider
    }

    async fn complete(&self, request: CompletionRequest) -> DeskResult<String> {
        let client = self.build_client(&request).await?;

        // The rendered template already carries prompt, tone and context
        let messages = vec![user!(request.prompt.as_str())];

        let response = client
            .chat(messages)
            .await
            .map_err(|e| self.llm_error(format!("LLM generation failed: {}", e), &request.model_name))?;

        response
            .content_text()
            .map(|content| content.to_string())
            .ok_or_else(|| {
                self.llm_error(
                    "No text content in LLM response".to_string(),
                    &request.model_name,
                )
            })
    }
}

/// Sends assembled prompts to a completion provider
pub struct GenerationInvoker {
    provider: Arc<dyn CompletionProvider>,
    api_key: Option<String>,
}

impl GenerationInvoker {
    pub fn new(provider: Arc<dyn CompletionProvider>, api_key: Option<String>) -> Self {
        Self { provider, api_key }
    }

    /// Run one completion and return the raw text
    pub async fn invoke(
        &self,
        assembled: &AssembledPrompt,
        generation: &GenerationConfig,
    ) -> RagResult<String> {
        let start_time = Instant::now();

        let request = CompletionRequest {
            model_name: generation.model_name.clone(),
            temperature: generation.temperature,
            max_tokens: generation.max_tokens,
            api_key: self.api_key.clone(),
            prompt: assembled.text.clone(),
            variables: assembled.variables.clone(),
        };

        debug!(
            provider = self.provider.name(),
            model = %generation.model_name,
            prompt_state = assembled.state.as_str(),
            prompt_chars = assembled.text.len(),
            "Invoking completion provider"
        );

        let text = self
            .provider
            .complete(request)
            .await
            .map_err(|source| RagError::Chain {
                provider: self.provider.name().to_string(),
                model: generation.model_name.clone(),
                source,
            })?;

        info!(
            "Generated completion in {:?} ({} chars)",
            start_time.elapsed(),
            text.len()
        );

        Ok(text)
    }
}
