//! HTTP JSON bodies exchanged with the search and chat endpoints.

use serde::{Deserialize, Serialize};

/// Client → search endpoint.
///
/// `enable_deep_analysis` is omitted entirely for the legacy `{query}` payload.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_deep_analysis: Option<bool>,
}

impl<'a> SearchRequest<'a> {
    pub fn new(query: &'a str, deep_analysis: bool) -> Self {
        Self {
            query,
            enable_deep_analysis: Some(deep_analysis),
        }
    }

    pub fn legacy(query: &'a str) -> Self {
        Self {
            query,
            enable_deep_analysis: None,
        }
    }
}

/// One citation returned alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub href: String,
    pub title: String,
    pub body: String,
}

/// Search endpoint → client. Result order is relevance order and is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub answer: String,
    #[serde(default)]
    pub search_results: Vec<SearchResult>,
    #[serde(default)]
    pub deep_analysis: bool,
}

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One chat message, as stored and as sent in `messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Client → chat endpoint. `messages` already ends with the new user turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub messages: Vec<ChatTurn>,
    pub context: &'a str,
    pub deep_analysis: bool,
    pub use_search: bool,
}

impl<'a> ChatRequest<'a> {
    pub fn new(
        history: &[ChatTurn],
        next_message: &str,
        context: &'a str,
        deep_analysis: bool,
        use_search: bool,
    ) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(ChatTurn::user(next_message));
        Self {
            messages,
            context,
            deep_analysis,
            use_search,
        }
    }
}

/// Chat endpoint → client.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
}
