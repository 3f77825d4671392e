//! Core trait definitions
//!
//! The generation engine only talks to its collaborators through these
//! capability traits, so stores and providers can be swapped for test doubles.

use crate::error::DeskResult;
use crate::types::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Read-only access to knowledge base articles
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Cheap availability check
    async fn ping(&self) -> DeskResult<()>;

    /// Full-text search over article content with a boolean token query
    /// (tokens joined by [`FULL_TEXT_OR`])
    async fn search_content(&self, query: &str) -> DeskResult<Vec<Article>>;

    /// Full-text search for the raw phrase
    async fn search_phrase(&self, phrase: &str) -> DeskResult<Vec<Article>>;

    /// Case-insensitive substring match on article titles
    async fn search_titles(&self, fragment: &str) -> DeskResult<Vec<Article>>;

    /// Point lookup by id
    async fn get_article(&self, id: &str) -> DeskResult<Option<Article>>;
}

/// Boolean OR operator understood by [`KnowledgeStore::search_content`]
pub const FULL_TEXT_OR: &str = " OR ";

/// Read-only access to ticket comments
#[async_trait]
pub trait TicketHistory: Send + Sync {
    /// All comments of a ticket, ascending by creation time
    async fn comments_for_ticket(&self, ticket_id: &str) -> DeskResult<Vec<TicketComment>>;
}

/// Variables handed to the completion provider alongside the assembled prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptVariables {
    /// The raw user prompt
    pub prompt: String,
    /// The configured tone token
    pub tone: String,
    /// Serialized article context (empty when no articles were supplied)
    pub context: String,
}

/// A single completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: Option<String>,
    /// Fully rendered prompt template
    pub prompt: String,
    pub variables: PromptVariables,
}

/// Single request/response text completion
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name used in logs and errors
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> DeskResult<String>;
}
