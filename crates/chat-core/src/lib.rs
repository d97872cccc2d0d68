//! # chat-core
//!
//! Domain core of sai-chat: session chats, the daily quota gate and the
//! provider ports the assistant talks through.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Send path                             │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  QuotaGate  │──│  ChatStore  │──│  Assistant          │  │
//! │  │  (per tier) │  │  (session)  │  │  (provider ports)   │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `CompletionProvider` and `ImageProvider` traits keep the hosted LLM
//! behind an explicit port; the assistant degrades to canned content and says
//! so when a provider fails.

pub mod assistant;
pub mod chat;
pub mod error;
pub mod message;
pub mod provider;
pub mod quota;

pub use assistant::{Assistant, AssistantConfig, Reply};
pub use chat::{Chat, ChatId, ChatOwner, ChatStore, MemoryChatStore};
pub use error::{ChatError, Result};
pub use message::{Message, Role};
pub use provider::{CompletionProvider, ImageProvider};
pub use quota::{Clock, DailyCounter, QuotaDecision, QuotaGate, QuotaLimits, SystemClock, Tier};
