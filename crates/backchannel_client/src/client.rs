//! HTTP client for the search and chat endpoints.
//!
//! Each `QueryClient` allows one active request at a time: beginning a new
//! request cancels whatever was in flight, and a cancelled request resolves to
//! `ClientError::Cancelled` no matter what the server eventually answers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::messages::{ChatReply, ChatRequest, ChatTurn, SearchRequest, SearchResponse};

/// Fixed per-request timeout used when the config does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// System preamble sent as `context` with every chat request.
pub const DEFAULT_CHAT_CONTEXT: &str = "You are BACKCHANNEL, a terse research assistant. \
Answer in markdown. When web search is enabled, cite the pages you used.";

/// Endpoint and payload settings for a `QueryClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub search_url: String,
    pub chat_url: String,
    pub timeout: Duration,
    /// Send `{query}` only, without `enable_deep_analysis`.
    pub legacy_search_payload: bool,
    pub chat_context: String,
}

impl ClientSettings {
    pub fn new(search_url: impl Into<String>, chat_url: impl Into<String>) -> Self {
        Self {
            search_url: search_url.into(),
            chat_url: chat_url.into(),
            timeout: DEFAULT_TIMEOUT,
            legacy_search_payload: false,
            chat_context: DEFAULT_CHAT_CONTEXT.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_legacy_search_payload(mut self, legacy: bool) -> Self {
        self.legacy_search_payload = legacy;
        self
    }

    pub fn with_chat_context(mut self, context: impl Into<String>) -> Self {
        self.chat_context = context.into();
        self
    }
}

/// Handle for one in-flight request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: u64,
    token: CancellationToken,
}

impl RequestContext {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Transport-level failure: the request did not produce a usable response.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("request failed: {0}")]
    Request(String),
}

impl NetworkError {
    fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout(timeout)
        } else if e.is_connect() {
            NetworkError::Connect(e.to_string())
        } else if e.is_decode() {
            NetworkError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            NetworkError::Status(status.as_u16())
        } else {
            NetworkError::Request(e.to_string())
        }
    }
}

/// Outcome of a failed search or chat call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// Superseded by a newer request or cancelled explicitly. Not user-visible.
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}

/// Sends search and chat requests for a single screen.
#[derive(Debug)]
pub struct QueryClient {
    http: reqwest::Client,
    settings: ClientSettings,
    active: Mutex<Option<RequestContext>>,
    next_id: AtomicU64,
}

impl QueryClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| NetworkError::Request(e.to_string()))?;
        Ok(Self {
            http,
            settings,
            active: Mutex::new(None),
            next_id: AtomicU64::new(0),
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<RequestContext>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new request context, cancelling the previously active one.
    pub fn begin(&self) -> RequestContext {
        let ctx = RequestContext {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            token: CancellationToken::new(),
        };
        if let Some(previous) = self.lock_active().replace(ctx.clone()) {
            debug!(superseded = previous.id, by = ctx.id, "cancelling in-flight request");
            previous.token.cancel();
        }
        ctx
    }

    /// Cancel the in-flight request, if any. Safe to call repeatedly.
    pub fn cancel_active(&self) {
        if let Some(ctx) = self.lock_active().take() {
            debug!(request = ctx.id, "cancelling active request");
            ctx.token.cancel();
        }
    }

    /// True while a request begun on this client has neither finished nor been cancelled.
    pub fn has_active(&self) -> bool {
        self.lock_active().is_some()
    }

    fn finish(&self, ctx: &RequestContext) {
        let mut active = self.lock_active();
        if active.as_ref().map(RequestContext::id) == Some(ctx.id) {
            *active = None;
        }
    }

    /// Run a search under a fresh request context.
    pub async fn search(
        &self,
        query: &str,
        deep_analysis: bool,
    ) -> Result<SearchResponse, ClientError> {
        let ctx = self.begin();
        self.search_in(&ctx, query, deep_analysis).await
    }

    /// Run a search under a context obtained from [`QueryClient::begin`].
    pub async fn search_in(
        &self,
        ctx: &RequestContext,
        query: &str,
        deep_analysis: bool,
    ) -> Result<SearchResponse, ClientError> {
        let body = if self.settings.legacy_search_payload {
            SearchRequest::legacy(query)
        } else {
            SearchRequest::new(query, deep_analysis)
        };
        debug!(request = ctx.id, deep_analysis, "sending search");
        let response: SearchResponse = self.post_json(ctx, &self.settings.search_url, &body).await?;
        info!(
            request = ctx.id,
            results = response.search_results.len(),
            "search answered"
        );
        Ok(response)
    }

    /// Send `history` plus `next_message` under a fresh request context.
    pub async fn chat(
        &self,
        history: &[ChatTurn],
        next_message: &str,
        deep_analysis: bool,
        use_search: bool,
    ) -> Result<String, ClientError> {
        let ctx = self.begin();
        self.chat_in(&ctx, history, next_message, deep_analysis, use_search)
            .await
    }

    pub async fn chat_in(
        &self,
        ctx: &RequestContext,
        history: &[ChatTurn],
        next_message: &str,
        deep_analysis: bool,
        use_search: bool,
    ) -> Result<String, ClientError> {
        let body = ChatRequest::new(
            history,
            next_message,
            &self.settings.chat_context,
            deep_analysis,
            use_search,
        );
        debug!(
            request = ctx.id,
            turns = body.messages.len(),
            deep_analysis,
            use_search,
            "sending chat"
        );
        let reply: ChatReply = self.post_json(ctx, &self.settings.chat_url, &body).await?;
        info!(request = ctx.id, "chat answered");
        Ok(reply.response)
    }

    async fn post_json<B, R>(
        &self,
        ctx: &RequestContext,
        url: &str,
        body: &B,
    ) -> Result<R, ClientError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let timeout = self.settings.timeout;
        let request = async {
            let response = self
                .http
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| NetworkError::from_reqwest(e, timeout))?;
            let status = response.status();
            if !status.is_success() {
                return Err(NetworkError::Status(status.as_u16()));
            }
            response
                .json::<R>()
                .await
                .map_err(|e| NetworkError::from_reqwest(e, timeout))
        };

        let outcome = tokio::select! {
            biased;
            _ = ctx.token.cancelled() => Err(ClientError::Cancelled),
            result = request => result.map_err(ClientError::from),
        };
        // A response that raced with cancellation is still discarded.
        let outcome = match outcome {
            Ok(_) if ctx.is_cancelled() => Err(ClientError::Cancelled),
            other => other,
        };
        if let Err(ClientError::Network(e)) = &outcome {
            warn!(request = ctx.id, error = %e, "request failed");
        }
        self.finish(ctx);
        outcome
    }
}
