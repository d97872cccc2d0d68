//! Identity Provider
//!
//! Email/password identity behind a port. The hosted identity service is out
//! of scope; `MemoryIdentityProvider` keeps argon2 hashes in memory.

use std::collections::HashMap;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{AccountError, Result};
use crate::user::Identity;

/// Shortest accepted password
pub const MIN_PASSWORD_LEN: usize = 6;

/// Email/password identity service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new identity
    async fn sign_up(&self, email: &str, password: &str, name: Option<&str>) -> Result<Identity>;

    /// Authenticate an existing identity
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    /// Forget an identity (admin deletion)
    async fn remove(&self, uid: &str) -> Result<()>;
}

/// Lowercase and trim; reject anything that is not `local@domain.tld`
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !email.contains(char::is_whitespace)
    });

    if valid {
        Ok(email)
    } else {
        Err(AccountError::InvalidEmail(email))
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hash(e.to_string()))
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

struct Credential {
    identity: Identity,
    password_hash: String,
}

/// In-memory identity provider (for development and tests)
#[derive(Default)]
pub struct MemoryIdentityProvider {
    by_email: RwLock<HashMap<String, Credential>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str, name: Option<&str>) -> Result<Identity> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::WeakPassword(MIN_PASSWORD_LEN));
        }
        if self.by_email.read().contains_key(&email) {
            return Err(AccountError::EmailTaken(email));
        }

        let password_hash = hash_password(password)?;
        let identity = Identity {
            uid: Uuid::new_v4().simple().to_string(),
            email: Some(email.clone()),
            display_name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
        };

        // Re-check under the write lock; hashing ran unlocked
        let mut by_email = self.by_email.write();
        if by_email.contains_key(&email) {
            return Err(AccountError::EmailTaken(email));
        }
        by_email.insert(
            email,
            Credential {
                identity: identity.clone(),
                password_hash,
            },
        );

        tracing::info!(uid = %identity.uid, "Identity registered");
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let email = normalize_email(email).map_err(|_| AccountError::InvalidCredentials)?;
        let by_email = self.by_email.read();
        let credential = by_email
            .get(&email)
            .ok_or(AccountError::InvalidCredentials)?;

        if verify_password(password, &credential.password_hash) {
            Ok(credential.identity.clone())
        } else {
            tracing::debug!(uid = %credential.identity.uid, "Password mismatch");
            Err(AccountError::InvalidCredentials)
        }
    }

    async fn remove(&self, uid: &str) -> Result<()> {
        self.by_email
            .write()
            .retain(|_, credential| credential.identity.uid != uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        assert!(normalize_email("ada").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("ada@localhost").is_err());
        assert!(normalize_email("a da@example.com").is_err());
    }

    #[test]
    fn test_hash_roundtrip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = MemoryIdentityProvider::new();
        let created = provider
            .sign_up("Ada@Example.com", "secret1", Some("Ada"))
            .await
            .unwrap();
        assert_eq!(created.email.as_deref(), Some("ada@example.com"));

        let signed_in = provider.sign_in("ada@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in, created);

        assert!(matches!(
            provider.sign_in("ada@example.com", "wrong!").await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_up_rejections() {
        let provider = MemoryIdentityProvider::new();
        provider.sign_up("ada@example.com", "secret1", None).await.unwrap();

        assert!(matches!(
            provider.sign_up("ADA@example.com", "secret2", None).await,
            Err(AccountError::EmailTaken(_))
        ));
        assert!(matches!(
            provider.sign_up("bob@example.com", "12345", None).await,
            Err(AccountError::WeakPassword(6))
        ));
        assert!(matches!(
            provider.sign_up("bob", "secret1", None).await,
            Err(AccountError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_frees_email() {
        let provider = MemoryIdentityProvider::new();
        let identity = provider.sign_up("ada@example.com", "secret1", None).await.unwrap();

        provider.remove(&identity.uid).await.unwrap();
        assert!(provider.sign_in("ada@example.com", "secret1").await.is_err());
        assert!(provider.sign_up("ada@example.com", "secret1", None).await.is_ok());
    }
}
