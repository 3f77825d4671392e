//! Response generator - the public entry point of the engine
//!
//! Sequences context gathering, prompt assembly, generation and response
//! analysis for one request. Nothing is cached or shared between calls.

use crate::context_gatherer::ContextGatherer;
use crate::llm_client::GenerationInvoker;
use crate::prompt::PromptPlan;
use crate::response_analyzer::analyze_response;
use crate::types::{GeneratedMessage, RagResult, RequestContext};
use deskpilot_core::{
    log_operation_start, log_operation_success, with_timeout,
    CompletionProvider, DeskpilotConfig, GenerationConfig, KnowledgeStore, TicketHistory,
};
use std::sync::Arc;
use tracing::{info_span, warn, Instrument};

/// Drafts support replies grounded in the knowledge base
pub struct ResponseGenerator {
    knowledge_store: Arc<dyn KnowledgeStore>,
    gatherer: ContextGatherer,
    invoker: GenerationInvoker,
    generation: GenerationConfig,
    timeout_ms: u64,
}

impl ResponseGenerator {
    pub fn new(
        knowledge_store: Arc<dyn KnowledgeStore>,
        ticket_history: Arc<dyn TicketHistory>,
        provider: Arc<dyn CompletionProvider>,
        config: &DeskpilotConfig,
    ) -> Self {
        let gatherer = ContextGatherer::new(
            knowledge_store.clone(),
            ticket_history,
            config.retrieval.clone(),
        );
        let invoker = GenerationInvoker::new(provider, config.llm.resolve_api_key());

        Self {
            knowledge_store,
            gatherer,
            invoker,
            generation: config.generation.clone(),
            timeout_ms: config.generation_timeout_ms,
        }
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation
    }

    /// Draft a reply to `prompt`. The caller's context is never modified.
    pub async fn generate_response(
        &self,
        prompt: &str,
        context: &RequestContext,
    ) -> RagResult<GeneratedMessage> {
        let span = info_span!(
            "generate_response",
            ticket_id = context.ticket_id.as_deref().unwrap_or("")
        );

        let result = with_timeout(
            self.run(prompt, context).instrument(span),
            self.timeout_ms,
            "generate_response",
        )
        .await;

        match result {
            Ok(inner) => inner,
            Err(e) => {
                e.log();
                Err(e.into())
            }
        }
    }

    /// Resolve the context that prompt assembly will see: health check, gather,
    /// then apply the forced-empty override
    pub async fn prepare_context(&self, context: &RequestContext) -> RagResult<RequestContext> {
        let mut context = context.clone();
        let caller_supplied = !context.relevant_articles.is_empty();

        if !caller_supplied {
            if let Err(e) = self.knowledge_store.ping().await {
                warn!(error = %e, "Knowledge store health check failed, answering without it");
                context.has_valid_db_access = false;
            }
        }

        if context.has_valid_db_access && !context.force_empty_results && !caller_supplied {
            context = self.gatherer.gather(context, &self.generation).await?;
        }

        if context.force_empty_results {
            context.relevant_articles.clear();
            context.has_valid_db_access = false;
        }

        if !context.has_valid_db_access {
            context.relevant_articles.clear();
        }

        Ok(context)
    }

    async fn run(&self, prompt: &str, context: &RequestContext) -> RagResult<GeneratedMessage> {
        log_operation_start!("generate_response");

        let context = self.prepare_context(context).await?;

        let plan = PromptPlan::select(
            context.has_valid_db_access,
            &context.relevant_articles,
            prompt,
            self.generation.tone,
        );
        let assembled = plan.render(self.generation.max_context_length);

        let raw = self.invoker.invoke(&assembled, &self.generation).await?;
        let analysis = analyze_response(&raw, context.force_empty_results);

        log_operation_success!(
            "generate_response",
            prompt_state = assembled.state.as_str(),
            articles_supplied = context.relevant_articles.len(),
            articles_cited = analysis.used_articles.len(),
            confidence = analysis.confidence
        );

        Ok(GeneratedMessage {
            content: raw,
            used_articles: analysis.used_articles,
            confidence: analysis.confidence,
            tone: self.generation.tone,
        })
    }
}
