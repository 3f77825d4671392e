//! Type definitions for the response generation pipeline
//!
//! Everything here lives for a single generate call and is never persisted.

use deskpilot_core::{Article, ConversationMessage, DeskError, Tone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn default_db_access() -> bool {
    true
}

/// Per-call request context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Prior conversation, oldest first
    #[serde(default)]
    pub previous_messages: Vec<ConversationMessage>,
    /// Candidate articles; a non-empty list supplied by the caller overrides retrieval
    #[serde(default)]
    pub relevant_articles: Vec<Article>,
    #[serde(default = "default_db_access")]
    pub has_valid_db_access: bool,
    /// Clear all articles and citations regardless of what the store holds
    #[serde(default)]
    pub force_empty_results: bool,
    /// Ignore `pinned_article_id`
    #[serde(default)]
    pub skip_test_articles: bool,
    /// Article looked up directly instead of searching
    #[serde(default)]
    pub pinned_article_id: Option<String>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            ticket_id: None,
            customer_id: None,
            previous_messages: Vec::new(),
            relevant_articles: Vec::new(),
            has_valid_db_access: true,
            force_empty_results: false,
            skip_test_articles: false,
            pinned_article_id: None,
        }
    }
}

impl RequestContext {
    /// Replace the article list, dropping repeated ids while keeping first occurrences
    pub fn set_articles(&mut self, articles: Vec<Article>) {
        let mut seen = BTreeSet::new();
        self.relevant_articles = articles
            .into_iter()
            .filter(|article| seen.insert(article.id.clone()))
            .collect();
    }
}

/// The drafted reply handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMessage {
    pub content: String,
    /// Ids of articles cited in `content`
    pub used_articles: BTreeSet<String>,
    /// Heuristic score in [0, 1]
    pub confidence: f32,
    pub tone: Tone,
}

/// Error types for the generation pipeline
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    /// The completion provider failed. Never retried.
    #[error("Chain error from {provider} ({model}): {source}")]
    Chain {
        provider: String,
        model: String,
        #[source]
        source: DeskError,
    },

    #[error("Ticket history error: {0}")]
    History(#[source] DeskError),

    #[error("Generation timed out after {0} ms")]
    Timeout(u64),

    #[error("Core error: {0}")]
    Core(Box<DeskError>),
}

impl From<DeskError> for RagError {
    fn from(err: DeskError) -> Self {
        match err {
            DeskError::Timeout { duration_ms, .. } => RagError::Timeout(duration_ms),
            other => RagError::Core(Box::new(other)),
        }
    }
}

impl RagError {
    /// Whether a later attempt may succeed. Provider failures are reported
    /// as final since the pipeline never retries them.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RagError::Timeout(_) => true,
            RagError::History(e) => e.is_recoverable(),
            RagError::Core(e) => e.is_recoverable(),
            RagError::Chain { .. } => false,
        }
    }
}

pub type RagResult<T> = Result<T, RagError>;
