//! Search and chat client for the backchannel answer service.
//! Used by the `backchannel` CLI; each screen session owns its own client.

pub mod cache;
pub mod chat;
pub mod client;
pub mod config;
pub mod conversation;
pub mod messages;
pub mod reveal;
pub mod search;

pub use cache::ResponseCache;
pub use chat::{ChatOutcome, ChatScreen, TranscriptEntry, CHAT_FAILURE_MESSAGE};
pub use client::{ClientError, ClientSettings, NetworkError, QueryClient, RequestContext};
pub use config::{default_config_path, ChatSection, Config, ConfigError, EndpointsSection, RevealSection};
pub use conversation::ConversationState;
pub use messages::{ChatTurn, Role, SearchResponse, SearchResult};
pub use reveal::{prefixes, RevealController};
pub use search::{SearchOutcome, SearchScreen, SEARCH_FAILURE_MESSAGE};
