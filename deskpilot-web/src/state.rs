//! Application state shared by all handlers

use crate::database::Database;
use crate::{WebConfig, WebResult};
use deskpilot_core::DeskpilotConfig;
use deskpilot_rag::{ResponseGenerator, SiumaiCompletionProvider};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: WebConfig,
    pub generator: Arc<ResponseGenerator>,
}

impl AppState {
    /// Open the database and wire the generator to the SQLite stores and the
    /// configured completion provider
    pub async fn new(config: WebConfig, app_config: DeskpilotConfig) -> WebResult<Self> {
        let database = Database::connect(config.database_url()).await?;
        let provider = SiumaiCompletionProvider::new(app_config.llm.clone());

        let generator = ResponseGenerator::new(
            Arc::new(database.knowledge_store()),
            Arc::new(database.ticket_history()),
            Arc::new(provider),
            &app_config,
        );

        info!(
            provider = %app_config.llm.provider,
            model = %app_config.generation.model_name,
            "Response generator ready"
        );

        Ok(Self::with_generator(config, generator))
    }

    /// State around an already-built generator
    pub fn with_generator(config: WebConfig, generator: ResponseGenerator) -> Self {
        Self {
            config,
            generator: Arc::new(generator),
        }
    }
}
