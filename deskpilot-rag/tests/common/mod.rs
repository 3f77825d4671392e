//! Test doubles for the generation pipeline collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use deskpilot_core::{
    Article, CommentMetadata, CompletionProvider, CompletionRequest, DeskError, DeskResult,
    DeskpilotConfig, ErrorContext, KnowledgeStore, MessageRole, TicketComment, TicketHistory,
    FULL_TEXT_OR,
};
use deskpilot_rag::ResponseGenerator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn article(id: &str, title: &str, content: &str) -> Article {
    Article {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        category_id: None,
    }
}

fn store_error(operation: &str) -> DeskError {
    DeskError::storage("store offline", "in_memory_store", operation, None)
}

/// Knowledge store over a fixed article list, with call recording and
/// per-operation failure switches
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    pub articles: Vec<Article>,
    pub fail_ping: bool,
    /// Pings succeed this many times, then fail
    pub fail_ping_after: Option<usize>,
    pub fail_content: bool,
    pub fail_phrase: bool,
    pub fail_titles: bool,
    pub calls: Mutex<Vec<String>>,
    pub pings: AtomicUsize,
}

impl InMemoryKnowledgeStore {
    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles,
            ..Default::default()
        }
    }

    /// Retrieval calls in order, as `operation:argument`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    fn record(&self, operation: &str, argument: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", operation, argument));
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn ping(&self) -> DeskResult<()> {
        let previous = self.pings.fetch_add(1, Ordering::SeqCst);
        let exhausted = self.fail_ping_after.is_some_and(|n| previous >= n);
        if self.fail_ping || exhausted {
            Err(store_error("ping"))
        } else {
            Ok(())
        }
    }

    async fn search_content(&self, query: &str) -> DeskResult<Vec<Article>> {
        self.record("content", query);
        if self.fail_content {
            return Err(store_error("search_content"));
        }
        let tokens: Vec<&str> = query.split(FULL_TEXT_OR).collect();
        Ok(self
            .articles
            .iter()
            .filter(|a| {
                let content = a.content.to_lowercase();
                tokens.iter().any(|t| content.contains(t))
            })
            .cloned()
            .collect())
    }

    async fn search_phrase(&self, phrase: &str) -> DeskResult<Vec<Article>> {
        self.record("phrase", phrase);
        if self.fail_phrase {
            return Err(store_error("search_phrase"));
        }
        let phrase = phrase.to_lowercase();
        Ok(self
            .articles
            .iter()
            .filter(|a| a.content.to_lowercase().contains(&phrase))
            .cloned()
            .collect())
    }

    async fn search_titles(&self, fragment: &str) -> DeskResult<Vec<Article>> {
        self.record("titles", fragment);
        if self.fail_titles {
            return Err(store_error("search_titles"));
        }
        let fragment = fragment.to_lowercase();
        Ok(self
            .articles
            .iter()
            .filter(|a| a.title.to_lowercase().contains(&fragment))
            .cloned()
            .collect())
    }

    async fn get_article(&self, id: &str) -> DeskResult<Option<Article>> {
        self.record("get", id);
        Ok(self.articles.iter().find(|a| a.id == id).cloned())
    }
}

/// Ticket history with canned comments per ticket
#[derive(Default)]
pub struct InMemoryTicketHistory {
    pub comments: Vec<(String, TicketComment)>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl InMemoryTicketHistory {
    pub fn with_comments(ticket_id: &str, comments: Vec<(Option<MessageRole>, &str)>) -> Self {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let comments = comments
            .into_iter()
            .enumerate()
            .map(|(i, (role, content))| {
                (
                    ticket_id.to_string(),
                    TicketComment {
                        author_id: format!("user-{}", i),
                        content: content.to_string(),
                        created_at: base + Duration::minutes(i as i64),
                        metadata: CommentMetadata { role },
                    },
                )
            })
            .collect();

        Self {
            comments,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TicketHistory for InMemoryTicketHistory {
    async fn comments_for_ticket(&self, ticket_id: &str) -> DeskResult<Vec<TicketComment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(store_error("comments_for_ticket"));
        }
        Ok(self
            .comments
            .iter()
            .filter(|(id, _)| id == ticket_id)
            .map(|(_, c)| c.clone())
            .collect())
    }
}

/// Completion provider returning a fixed reply and recording every request
pub struct ScriptedProvider {
    pub reply: String,
    pub fail: bool,
    pub delay_ms: u64,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
            delay_ms: 0,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::replying("")
        }
    }

    pub fn last_request(&self) -> CompletionRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no completion request recorded")
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> DeskResult<String> {
        self.requests.lock().unwrap().push(request);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail {
            return Err(DeskError::Llm {
                message: "upstream returned 503".to_string(),
                provider: Some("scripted".to_string()),
                model: None,
                context: ErrorContext::new("scripted_provider"),
            });
        }
        Ok(self.reply.clone())
    }
}

pub struct Harness {
    pub store: Arc<InMemoryKnowledgeStore>,
    pub history: Arc<InMemoryTicketHistory>,
    pub provider: Arc<ScriptedProvider>,
    pub generator: ResponseGenerator,
}

pub fn harness(
    store: InMemoryKnowledgeStore,
    history: InMemoryTicketHistory,
    provider: ScriptedProvider,
    config: DeskpilotConfig,
) -> Harness {
    let store = Arc::new(store);
    let history = Arc::new(history);
    let provider = Arc::new(provider);
    let generator = ResponseGenerator::new(store.clone(), history.clone(), provider.clone(), &config);

    Harness {
        store,
        history,
        provider,
        generator,
    }
}
