//! Core data type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A knowledge base article as exposed by the knowledge store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category_id: Option<String>,
}

/// Who wrote a message in a ticket conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    #[default]
    Customer,
    Agent,
}

impl MessageRole {
    /// Parse a role label stored in comment metadata. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "customer" => Some(MessageRole::Customer),
            "agent" => Some(MessageRole::Agent),
            _ => None,
        }
    }
}

/// One message of prior conversation, in chronological order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    #[serde(default)]
    pub role: MessageRole,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Metadata attached to a ticket comment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentMetadata {
    pub role: Option<MessageRole>,
}

/// A ticket comment as exposed by the ticket history store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketComment {
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: CommentMetadata,
}

impl From<TicketComment> for ConversationMessage {
    fn from(comment: TicketComment) -> Self {
        Self {
            role: comment.metadata.role.unwrap_or(MessageRole::Agent),
            content: comment.content,
            timestamp: comment.created_at,
        }
    }
}

/// Voice requested for the drafted reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Casual,
    Friendly,
    #[default]
    Professional,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Casual => "casual",
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation settings for a draft reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Model name passed to the completion provider
    pub model_name: String,
    /// Character budget for article bodies embedded in the prompt
    pub max_context_length: usize,
    /// Whether to search the knowledge base
    pub include_knowledge_base: bool,
    /// Whether to load the ticket's comment history
    pub include_ticket_history: bool,
    /// Tone of the drafted reply
    pub tone: Tone,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            model_name: "gpt-4o-mini".to_string(),
            max_context_length: 4000,
            include_knowledge_base: true,
            include_ticket_history: true,
            tone: Tone::Professional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_without_role_maps_to_agent() {
        let comment = TicketComment {
            author_id: "user-1".to_string(),
            content: "We are looking into it".to_string(),
            created_at: Utc::now(),
            metadata: CommentMetadata::default(),
        };

        let message = ConversationMessage::from(comment);
        assert_eq!(message.role, MessageRole::Agent);
        assert_eq!(message.content, "We are looking into it");
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(MessageRole::from_label("Customer"), Some(MessageRole::Customer));
        assert_eq!(MessageRole::from_label(" agent "), Some(MessageRole::Agent));
        assert_eq!(MessageRole::from_label("bot"), None);
    }

    #[test]
    fn test_tone_serialization() {
        let json = serde_json::to_string(&Tone::Friendly).unwrap();
        assert_eq!(json, "\"friendly\"");
        let tone: Tone = serde_json::from_str("\"formal\"").unwrap();
        assert_eq!(tone, Tone::Formal);
        assert_eq!(Tone::default().to_string(), "professional");
    }

    #[test]
    fn test_article_uses_camel_case() {
        let article: Article = serde_json::from_str(
            r#"{"id":"A1","title":"Password Reset Guide","content":"Steps","categoryId":"auth"}"#,
        )
        .unwrap();
        assert_eq!(article.category_id.as_deref(), Some("auth"));
    }
}
