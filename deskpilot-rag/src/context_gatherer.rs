//! Context gathering
//!
//! Finds candidate knowledge base articles for a request through an ordered
//! fallback chain of search strategies, and loads the ticket's comment history.
//! Store failures during retrieval never fail the request; they only mean
//! "no results from this step".

use crate::types::{RagError, RagResult, RequestContext};
use deskpilot_core::{
    Article, ConversationMessage, GenerationConfig, HistoryFailurePolicy, KnowledgeStore,
    RetrievalConfig, TicketHistory, FULL_TEXT_OR,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Words dropped from the token query
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "that", "with", "you", "can", "about", "tell", "much",
];

/// Tokens of this many characters or fewer are dropped
const MIN_TOKEN_CHARS: usize = 2;

/// Retrieval strategies, tried in this order until one returns articles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Full-text search over content with significant tokens joined by OR
    TokenQuery,
    /// Full-text search for the original term as a phrase
    RawPhrase,
    /// Case-insensitive substring match on titles
    TitleMatch,
}

impl SearchStrategy {
    pub const CHAIN: [SearchStrategy; 3] = [
        SearchStrategy::TokenQuery,
        SearchStrategy::RawPhrase,
        SearchStrategy::TitleMatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::TokenQuery => "token_query",
            SearchStrategy::RawPhrase => "raw_phrase",
            SearchStrategy::TitleMatch => "title_match",
        }
    }
}

/// Lowercase, strip punctuation, split on whitespace, and drop short tokens and stop words
pub fn tokenize_search_term(term: &str) -> Vec<String> {
    let cleaned: String = term
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();

    let mut tokens: Vec<String> = Vec::new();
    for token in cleaned.split_whitespace() {
        if token.chars().count() <= MIN_TOKEN_CHARS || STOP_WORDS.contains(&token) {
            continue;
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// The search term is the content of the most recent previous message
pub fn derive_search_term(messages: &[ConversationMessage]) -> String {
    messages
        .last()
        .map(|message| message.content.trim().to_string())
        .unwrap_or_default()
}

/// Enriches a request context with articles and conversation history
pub struct ContextGatherer {
    knowledge_store: Arc<dyn KnowledgeStore>,
    ticket_history: Arc<dyn TicketHistory>,
    config: RetrievalConfig,
}

impl ContextGatherer {
    pub fn new(
        knowledge_store: Arc<dyn KnowledgeStore>,
        ticket_history: Arc<dyn TicketHistory>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            knowledge_store,
            ticket_history,
            config,
        }
    }

    /// Gather articles and history into `context`
    pub async fn gather(
        &self,
        mut context: RequestContext,
        generation: &GenerationConfig,
    ) -> RagResult<RequestContext> {
        if !context.relevant_articles.is_empty() {
            debug!(
                article_count = context.relevant_articles.len(),
                "Caller supplied articles, skipping retrieval"
            );
        } else if generation.include_knowledge_base {
            match self.knowledge_store.ping().await {
                Ok(()) => {
                    let term = derive_search_term(&context.previous_messages);
                    let pinned = if context.skip_test_articles {
                        None
                    } else {
                        context.pinned_article_id.as_deref()
                    };
                    let articles = self.find_articles(&term, pinned).await;
                    context.set_articles(articles);
                }
                Err(e) => {
                    warn!(error = %e, "Knowledge store unavailable, skipping retrieval");
                    context.has_valid_db_access = false;
                    context.relevant_articles.clear();
                }
            }
        }

        if generation.include_ticket_history {
            if let Some(ticket_id) = context.ticket_id.clone() {
                if let Some(history) = self.load_history(&ticket_id).await? {
                    context.previous_messages = history;
                }
            }
        }

        Ok(context)
    }

    /// Run the pinned lookup and the fallback chain for `term`
    pub async fn find_articles(&self, term: &str, pinned_article_id: Option<&str>) -> Vec<Article> {
        let term = term.trim();
        if term.is_empty() {
            debug!("Empty search term, skipping retrieval");
            return Vec::new();
        }

        if let Some(id) = pinned_article_id {
            match self.knowledge_store.get_article(id).await {
                Ok(Some(article)) => {
                    info!(article_id = %id, "Using pinned article");
                    return vec![article];
                }
                Ok(None) => debug!(article_id = %id, "Pinned article not found, searching instead"),
                Err(e) => warn!(article_id = %id, error = %e, "Pinned article lookup failed"),
            }
        }

        for strategy in SearchStrategy::CHAIN {
            let result = match strategy {
                SearchStrategy::TokenQuery => {
                    let tokens = tokenize_search_term(term);
                    if tokens.is_empty() {
                        debug!(strategy = strategy.as_str(), "No significant tokens");
                        continue;
                    }
                    self.knowledge_store
                        .search_content(&tokens.join(FULL_TEXT_OR))
                        .await
                }
                SearchStrategy::RawPhrase => self.knowledge_store.search_phrase(term).await,
                SearchStrategy::TitleMatch => self.knowledge_store.search_titles(term).await,
            };

            match result {
                Ok(mut articles) if !articles.is_empty() => {
                    articles.truncate(self.config.max_articles);
                    info!(
                        strategy = strategy.as_str(),
                        article_count = articles.len(),
                        "Found relevant articles"
                    );
                    return articles;
                }
                Ok(_) => debug!(strategy = strategy.as_str(), "No articles found"),
                Err(e) => warn!(strategy = strategy.as_str(), error = %e, "Search strategy failed"),
            }
        }

        debug!("All search strategies exhausted");
        Vec::new()
    }

    /// Load history for a ticket. `Ok(None)` means keep the caller's messages.
    async fn load_history(&self, ticket_id: &str) -> RagResult<Option<Vec<ConversationMessage>>> {
        match self.ticket_history.comments_for_ticket(ticket_id).await {
            Ok(comments) if comments.is_empty() => Ok(None),
            Ok(comments) => {
                debug!(ticket_id = %ticket_id, comment_count = comments.len(), "Loaded ticket history");
                Ok(Some(comments.into_iter().map(ConversationMessage::from).collect()))
            }
            Err(e) => match self.config.history_failure_policy {
                HistoryFailurePolicy::Degrade => {
                    warn!(ticket_id = %ticket_id, error = %e, "Failed to load ticket history");
                    Ok(None)
                }
                HistoryFailurePolicy::Propagate => Err(RagError::History(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_short_tokens_and_stop_words() {
        let tokens = tokenize_search_term("Can you tell me about the password, reset?");
        assert_eq!(tokens, vec!["password", "reset"]);
    }

    #[test]
    fn test_tokenize_keeps_three_letter_words() {
        let tokens = tokenize_search_term("How do I reset my password?");
        assert_eq!(tokens, vec!["how", "reset", "password"]);
    }

    #[test]
    fn test_tokenize_only_noise() {
        assert!(tokenize_search_term("?? a an to the and").is_empty());
        assert!(tokenize_search_term("   ").is_empty());
    }

    #[test]
    fn test_derive_search_term_uses_last_message() {
        let messages = vec![
            ConversationMessage {
                role: deskpilot_core::MessageRole::Customer,
                content: "first".to_string(),
                timestamp: chrono::Utc::now(),
            },
            ConversationMessage {
                role: deskpilot_core::MessageRole::Customer,
                content: "  billing invoice  ".to_string(),
                timestamp: chrono::Utc::now(),
            },
        ];
        assert_eq!(derive_search_term(&messages), "billing invoice");
        assert_eq!(derive_search_term(&[]), "");
    }
}
