//! Chat Send Path
//!
//! ```text
//! caller ─▶ image allowed? ─▶ consume quota ─▶ append user msg ─▶ assistant ─▶ append reply
//!              │ no: 403          │ exhausted: 429
//! ```
//!
//! The quota is consumed before the assistant is awaited. A rejected send
//! never counts and never appends. If the chat is gone by the time the user
//! message is appended, the message is handed back to the caller's quota.
//! Both appends run under the chat store's write lock, so concurrent sends to
//! one chat keep every message.

use chat_core::{ChatError, ChatId, Message, QuotaDecision, QuotaGate, Tier};
use serde::{Deserialize, Serialize};

use crate::auth::Caller;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub content: String,

    /// Generate an image from `content` instead of a text reply
    #[serde(default)]
    pub image: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub user_message: Message,
    pub assistant_message: Message,

    /// Position for the next message
    pub quota: QuotaDecision,

    /// The assistant answered with fallback content
    pub degraded: bool,
}

pub struct ChatService<'a> {
    state: &'a AppState,
}

impl<'a> ChatService<'a> {
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Current quota position without consuming
    pub fn quota(&self, caller: &Caller) -> QuotaDecision {
        let gate = self.state.gate;
        match caller {
            Caller::User(user) => gate.check(user.record.tier(), user.record.daily_usage),
            Caller::Guest(key) => gate.check(Tier::Guest, self.state.guests.snapshot(key).used),
        }
    }

    /// Count one message for the caller, or refuse
    fn consume(&self, caller: &Caller) -> ApiResult<QuotaDecision> {
        let gate: QuotaGate = self.state.gate;

        let used = match caller {
            Caller::User(user) => {
                let decision = self.state.users.try_consume(&user.record.id, &gate)?;
                if !decision.allowed {
                    return Err(ChatError::QuotaExceeded {
                        used: decision.used,
                        limit: decision.limit.unwrap_or_default(),
                    }
                    .into());
                }
                decision.used
            }
            Caller::Guest(key) => match self.state.guests.try_increment(key) {
                Ok(usage) => usage.used,
                Err(usage) => {
                    return Err(ChatError::QuotaExceeded {
                        used: usage.used,
                        limit: usage.limit,
                    }
                    .into());
                }
            },
        };

        Ok(gate.check(caller.tier(), used))
    }

    /// Hand back a message counted by `consume`
    fn refund(&self, caller: &Caller, quota: &QuotaDecision) {
        if quota.limit.is_none() {
            return;
        }
        match caller {
            Caller::User(user) => {
                if let Err(e) = self.state.users.refund(&user.record.id) {
                    tracing::warn!(uid = %user.record.id, error = %e, "Quota refund failed");
                }
            }
            Caller::Guest(key) => self.state.guests.refund(key),
        }
    }

    pub async fn send(
        &self,
        caller: &Caller,
        chat_id: &ChatId,
        request: SendRequest,
    ) -> ApiResult<SendResponse> {
        let content = request.content.trim().to_string();
        if content.is_empty() {
            return Err(ChatError::InvalidInput("Message cannot be empty".into()).into());
        }

        let owner = caller.owner();
        self.state.chats.get(&owner, chat_id)?;

        let tier = caller.tier();
        if request.image && !QuotaGate::can_generate_image(tier) {
            tracing::info!(chat = %chat_id, tier = ?tier, "Image generation refused");
            return Err(ChatError::ImageNotAllowed.into());
        }

        let quota = self.consume(caller)?;

        let user_message = Message::user(content.clone());
        let chat = match self.state.chats.append(&owner, chat_id, user_message.clone()) {
            Ok(chat) => chat,
            Err(e) => {
                self.refund(caller, &quota);
                return Err(e.into());
            }
        };

        let reply = if request.image {
            self.state.assistant.illustrate(&content).await
        } else {
            self.state.assistant.reply(&chat).await
        };

        let degraded = reply.degraded;
        if degraded {
            tracing::warn!(chat = %chat_id, image = request.image, "Replying in degraded mode");
        }

        let assistant_message = reply.into_message();
        match self
            .state
            .chats
            .append(&owner, chat_id, assistant_message.clone())
        {
            Ok(_) => {}
            // Deleted while the provider was working; the reply is still served
            Err(ChatError::ChatNotFound(_)) => {
                tracing::warn!(chat = %chat_id, "Chat deleted before the reply was stored");
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(
            chat = %chat_id,
            tier = ?tier,
            used = quota.used,
            "Message sent"
        );

        Ok(SendResponse {
            user_message,
            assistant_message,
            quota,
            degraded,
        })
    }
}
