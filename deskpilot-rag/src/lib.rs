//! Deskpilot RAG - contextual response generation
//!
//! Drafts replies to customer questions grounded in knowledge base articles
//! and prior ticket conversation, then reports which articles were cited and
//! a heuristic confidence score.

pub mod context_gatherer;
pub mod generator;
pub mod llm_client;
pub mod prompt;
pub mod response_analyzer;
pub mod types;

pub use context_gatherer::{derive_search_term, tokenize_search_term, ContextGatherer, SearchStrategy};
pub use generator::ResponseGenerator;
pub use llm_client::{GenerationInvoker, SiumaiCompletionProvider};
pub use prompt::{AssembledPrompt, PromptPlan, PromptState};
pub use response_analyzer::{analyze_response, confidence_score, extract_cited_articles, ResponseAnalysis};
pub use types::{GeneratedMessage, RagError, RagResult, RequestContext};
