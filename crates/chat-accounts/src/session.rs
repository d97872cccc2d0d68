//! Auth Sessions
//!
//! Opaque bearer tokens mapped to identity uids.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{AccountError, Result};

#[derive(Clone, Debug)]
struct SessionEntry {
    uid: String,
    issued_at: DateTime<Utc>,
}

/// Bearer-token session table
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `uid` and return its token
    pub fn issue(&self, uid: &str) -> String {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.sessions.write().insert(
            token.clone(),
            SessionEntry {
                uid: uid.to_string(),
                issued_at: Utc::now(),
            },
        );
        tracing::debug!(uid, "Session issued");
        token
    }

    pub fn resolve(&self, token: &str) -> Result<String> {
        self.sessions
            .read()
            .get(token)
            .map(|entry| entry.uid.clone())
            .ok_or(AccountError::SessionInvalid)
    }

    /// When the session was issued
    pub fn issued_at(&self, token: &str) -> Option<DateTime<Utc>> {
        self.sessions.read().get(token).map(|entry| entry.issued_at)
    }

    /// End one session. Returns false if it was already gone.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    /// End every session of a user; returns the revoked tokens
    pub fn revoke_user(&self, uid: &str) -> Vec<String> {
        let mut sessions = self.sessions.write();
        let tokens: Vec<String> = sessions
            .iter()
            .filter(|(_, entry)| entry.uid == uid)
            .map(|(token, _)| token.clone())
            .collect();

        for token in &tokens {
            sessions.remove(token);
        }
        tokens
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_resolve() {
        let sessions = SessionStore::new();
        let token = sessions.issue("u1");

        assert_eq!(token.len(), 64);
        assert_eq!(sessions.resolve(&token).unwrap(), "u1");
        assert!(sessions.issued_at(&token).is_some());
        assert!(matches!(
            sessions.resolve("nope"),
            Err(AccountError::SessionInvalid)
        ));
    }

    #[test]
    fn test_revoke() {
        let sessions = SessionStore::new();
        let token = sessions.issue("u1");

        assert!(sessions.revoke(&token));
        assert!(!sessions.revoke(&token));
        assert!(sessions.resolve(&token).is_err());
    }

    #[test]
    fn test_revoke_user_keeps_others() {
        let sessions = SessionStore::new();
        let a1 = sessions.issue("a");
        let a2 = sessions.issue("a");
        let b = sessions.issue("b");

        let mut revoked = sessions.revoke_user("a");
        revoked.sort();
        let mut expected = vec![a1, a2];
        expected.sort();

        assert_eq!(revoked, expected);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.resolve(&b).unwrap(), "b");
    }
}
