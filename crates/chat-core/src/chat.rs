//! Session Chats
//!
//! Chats live only as long as the browser session that owns them. An owner is
//! either an auth session token or a guest client key.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ChatError, Result};
use crate::message::{Message, Role};

/// Title given to chats before their first message
pub const DEFAULT_TITLE: &str = "New chat";

const TITLE_CHARS: usize = 30;

/// Unique chat identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(String);

impl ChatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of whoever owns a set of chats
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatOwner {
    /// Authenticated session, keyed by its bearer token
    Session(String),
    /// Guest, keyed by client address or local key
    Guest(String),
}

/// An ordered conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,

    pub title: String,

    messages: Vec<Message>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Create an empty chat
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ChatId::new(),
            title: DEFAULT_TITLE.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message. The first user message names the chat.
    pub fn push(&mut self, message: Message) {
        if self.messages.is_empty() && message.role == Role::User {
            self.title = title_from(&message.content);
        }
        self.messages.push(message);
        self.touch();
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

fn title_from(content: &str) -> String {
    let trimmed = content.trim();
    let preview: String = trimmed.chars().take(TITLE_CHARS).collect();
    if trimmed.chars().count() > TITLE_CHARS {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Chat storage scoped to an owner
pub trait ChatStore: Send + Sync {
    /// Create and store an empty chat
    fn create(&self, owner: &ChatOwner) -> Chat;

    /// Chats of an owner, most recently updated first
    fn list(&self, owner: &ChatOwner) -> Vec<Chat>;

    fn get(&self, owner: &ChatOwner, id: &ChatId) -> Result<Chat>;

    /// Push a message onto the stored chat in one step
    fn append(&self, owner: &ChatOwner, id: &ChatId, message: Message) -> Result<Chat>;

    fn rename(&self, owner: &ChatOwner, id: &ChatId, title: &str) -> Result<Chat>;

    fn delete(&self, owner: &ChatOwner, id: &ChatId) -> Result<()>;

    /// Forget everything an owner had (sign-out)
    fn drop_owner(&self, owner: &ChatOwner);
}

/// In-memory chat store
#[derive(Default)]
pub struct MemoryChatStore {
    chats: RwLock<HashMap<ChatOwner, HashMap<ChatId, Chat>>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChatStore for MemoryChatStore {
    fn create(&self, owner: &ChatOwner) -> Chat {
        let chat = Chat::new();
        self.chats
            .write()
            .entry(owner.clone())
            .or_default()
            .insert(chat.id.clone(), chat.clone());
        chat
    }

    fn list(&self, owner: &ChatOwner) -> Vec<Chat> {
        let chats = self.chats.read();
        let mut result: Vec<_> = chats
            .get(owner)
            .map(|owned| owned.values().cloned().collect())
            .unwrap_or_default();

        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        result
    }

    fn get(&self, owner: &ChatOwner, id: &ChatId) -> Result<Chat> {
        self.chats
            .read()
            .get(owner)
            .and_then(|owned| owned.get(id))
            .cloned()
            .ok_or_else(|| ChatError::ChatNotFound(id.to_string()))
    }

    fn append(&self, owner: &ChatOwner, id: &ChatId, message: Message) -> Result<Chat> {
        let mut chats = self.chats.write();
        let chat = chats
            .get_mut(owner)
            .and_then(|owned| owned.get_mut(id))
            .ok_or_else(|| ChatError::ChatNotFound(id.to_string()))?;
        chat.push(message);
        Ok(chat.clone())
    }

    fn rename(&self, owner: &ChatOwner, id: &ChatId, title: &str) -> Result<Chat> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::InvalidInput("Title cannot be empty".into()));
        }

        let mut chats = self.chats.write();
        let chat = chats
            .get_mut(owner)
            .and_then(|owned| owned.get_mut(id))
            .ok_or_else(|| ChatError::ChatNotFound(id.to_string()))?;
        chat.rename(title);
        Ok(chat.clone())
    }

    fn delete(&self, owner: &ChatOwner, id: &ChatId) -> Result<()> {
        let removed = self
            .chats
            .write()
            .get_mut(owner)
            .and_then(|owned| owned.remove(id));

        removed
            .map(|_| ())
            .ok_or_else(|| ChatError::ChatNotFound(id.to_string()))
    }

    fn drop_owner(&self, owner: &ChatOwner) {
        self.chats.write().remove(owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> ChatOwner {
        ChatOwner::Session("token-a".into())
    }

    #[test]
    fn test_first_user_message_sets_title() {
        let mut chat = Chat::new();
        assert_eq!(chat.title, DEFAULT_TITLE);

        chat.push(Message::user("What is the tallest mountain in Turkey?"));
        assert_eq!(chat.title, "What is the tallest mountain i...");

        chat.push(Message::assistant("Mount Ararat."));
        chat.push(Message::user("And the longest river?"));
        assert_eq!(chat.title, "What is the tallest mountain i...");
    }

    #[test]
    fn test_short_title_not_truncated() {
        let mut chat = Chat::new();
        chat.push(Message::user("Hi"));
        assert_eq!(chat.title, "Hi");
    }

    #[test]
    fn test_reload_preserves_order_and_content() {
        let store = MemoryChatStore::new();
        let id = store.create(&owner()).id;

        store.append(&owner(), &id, Message::user("one")).unwrap();
        store.append(&owner(), &id, Message::assistant("two")).unwrap();
        let chat = store.append(&owner(), &id, Message::user("three")).unwrap();
        assert_eq!(chat.title, "one");

        let reloaded = store.get(&owner(), &id).unwrap();
        let contents: Vec<_> = reloaded.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
        assert_eq!(reloaded.messages(), chat.messages());
    }

    #[test]
    fn test_concurrent_appends_are_all_kept() {
        let store = std::sync::Arc::new(MemoryChatStore::new());
        let id = store.create(&owner()).id;

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let (store, id) = (store.clone(), id.clone());
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.append(&owner(), &id, Message::user(format!("{n}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get(&owner(), &id).unwrap().messages().len(), 200);
    }

    #[test]
    fn test_append_to_deleted_chat_fails() {
        let store = MemoryChatStore::new();
        let id = store.create(&owner()).id;
        store.delete(&owner(), &id).unwrap();

        assert!(matches!(
            store.append(&owner(), &id, Message::user("late")),
            Err(ChatError::ChatNotFound(_))
        ));
    }

    #[test]
    fn test_owners_are_isolated() {
        let store = MemoryChatStore::new();
        let chat = store.create(&owner());
        let other = ChatOwner::Guest("10.0.0.7".into());

        assert!(store.get(&other, &chat.id).is_err());
        assert!(store.list(&other).is_empty());
        assert_eq!(store.list(&owner()).len(), 1);
    }

    #[test]
    fn test_rename_and_delete() {
        let store = MemoryChatStore::new();
        let chat = store.create(&owner());

        let renamed = store.rename(&owner(), &chat.id, "  Trip plans ").unwrap();
        assert_eq!(renamed.title, "Trip plans");
        assert!(store.rename(&owner(), &chat.id, "   ").is_err());

        store.delete(&owner(), &chat.id).unwrap();
        assert!(matches!(
            store.get(&owner(), &chat.id),
            Err(ChatError::ChatNotFound(_))
        ));
        assert!(store.delete(&owner(), &chat.id).is_err());
    }

    #[test]
    fn test_drop_owner_clears_chats() {
        let store = MemoryChatStore::new();
        store.create(&owner());
        store.create(&owner());
        store.drop_owner(&owner());
        assert!(store.list(&owner()).is_empty());
    }
}
