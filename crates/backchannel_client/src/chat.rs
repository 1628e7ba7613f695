//! Chat screen session: conversation history and single-flight chat requests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::client::{ClientError, QueryClient};
use crate::conversation::ConversationState;

/// Transcript text shown when a chat request fails.
pub const CHAT_FAILURE_MESSAGE: &str = "ERROR: Unable to reach chat server.";

/// One line of the visible chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    User(String),
    Assistant(String),
    /// Stands in for an assistant reply; never sent back to the server.
    Error(String),
}

/// What a call to [`ChatScreen::send`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Ignored,
    Replied(String),
    Failed { message: String },
    Superseded,
}

#[derive(Debug, Default)]
struct ChatView {
    conversation: ConversationState,
    transcript: Vec<TranscriptEntry>,
    pending: Option<String>,
    deep_analysis: bool,
    use_search: bool,
}

/// State owned by one chat screen.
///
/// A message is committed to the conversation only together with its reply.
/// A failed exchange shows up in the transcript but is not replayed to the
/// server, so resending the same text does not duplicate the user turn.
#[derive(Debug)]
pub struct ChatScreen {
    client: QueryClient,
    state: Mutex<ChatView>,
}

impl ChatScreen {
    pub fn new(client: QueryClient) -> Self {
        Self {
            client,
            state: Mutex::new(ChatView::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatView> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn send(&self, text: &str) -> ChatOutcome {
        if text.trim().is_empty() {
            return ChatOutcome::Ignored;
        }

        let (ctx, history, deep_analysis, use_search) = {
            let mut state = self.lock();
            let ctx = self.client.begin();
            state.pending = Some(text.to_string());
            (
                ctx,
                state.conversation.to_request_turns(),
                state.deep_analysis,
                state.use_search,
            )
        };

        let result = self
            .client
            .chat_in(&ctx, &history, text, deep_analysis, use_search)
            .await;

        let mut state = self.lock();
        if ctx.is_cancelled() {
            debug!(request = ctx.id(), "chat superseded");
            return ChatOutcome::Superseded;
        }
        state.pending = None;
        match result {
            Ok(reply) => {
                state.conversation.append_user(text);
                state.conversation.append_assistant(reply.clone());
                state.transcript.push(TranscriptEntry::User(text.to_string()));
                state
                    .transcript
                    .push(TranscriptEntry::Assistant(reply.clone()));
                ChatOutcome::Replied(reply)
            }
            Err(ClientError::Cancelled) => ChatOutcome::Superseded,
            Err(ClientError::Network(e)) => {
                warn!(error = %e, "chat failed");
                state.transcript.push(TranscriptEntry::User(text.to_string()));
                state
                    .transcript
                    .push(TranscriptEntry::Error(CHAT_FAILURE_MESSAGE.to_string()));
                ChatOutcome::Failed {
                    message: CHAT_FAILURE_MESSAGE.to_string(),
                }
            }
        }
    }

    /// Abandon the in-flight message, if any.
    pub fn cancel(&self) {
        let mut state = self.lock();
        self.client.cancel_active();
        state.pending = None;
    }

    pub fn set_deep_analysis(&self, enabled: bool) {
        self.lock().deep_analysis = enabled;
    }

    pub fn set_use_search(&self, enabled: bool) {
        self.lock().use_search = enabled;
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock().transcript.clone()
    }

    pub fn conversation(&self) -> ConversationState {
        self.lock().conversation.clone()
    }

    /// The message currently waiting for a reply.
    pub fn pending(&self) -> Option<String> {
        self.lock().pending.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().pending.is_some()
    }
}
