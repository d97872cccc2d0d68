//! Admin Operations
//!
//! User management for accounts flagged `is_admin`. Authorization happens at
//! the HTTP edge; everything here assumes the caller is already an admin.

use std::sync::Arc;

use chat_billing::{BillingPeriod, Plan};
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, Result};
use crate::identity::IdentityProvider;
use crate::session::SessionStore;
use crate::store::UserStore;
use crate::user::UserRecord;

/// Admin list filter
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserFilter {
    /// Only users on this plan
    pub plan: Option<Plan>,

    /// Case-insensitive substring of name or email
    pub search: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &UserRecord) -> bool {
        if self.plan.is_some_and(|plan| plan != user.plan) {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                user.name.to_lowercase().contains(&term)
                    || user
                        .email
                        .as_deref()
                        .is_some_and(|email| email.to_lowercase().contains(&term))
            }
        }
    }
}

/// Aggregate user counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: usize,
    pub pro_users: usize,
    pub free_users: usize,
}

/// Result of deleting a user
#[derive(Clone, Debug, Default)]
pub struct DeletedUser {
    /// Session tokens that were revoked with the user
    pub revoked_sessions: Vec<String>,
}

pub struct AdminService {
    users: Arc<dyn UserStore>,
    sessions: Arc<SessionStore>,
    identities: Arc<dyn IdentityProvider>,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<SessionStore>,
        identities: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            users,
            sessions,
            identities,
        }
    }

    /// Users matching `filter`, newest first
    pub fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserRecord>> {
        Ok(self
            .users
            .list()?
            .into_iter()
            .filter(|user| filter.matches(user))
            .collect())
    }

    pub fn stats(&self) -> Result<UserStats> {
        let users = self.users.list()?;
        let pro_users = users.iter().filter(|u| u.plan == Plan::Pro).count();

        Ok(UserStats {
            total_users: users.len(),
            pro_users,
            free_users: users.len() - pro_users,
        })
    }

    /// Grant or revoke pro directly. Pro grants run for one monthly period.
    pub fn set_plan(&self, uid: &str, plan: Plan) -> Result<UserRecord> {
        let record = self.users.set_plan(uid, plan, BillingPeriod::Monthly, None)?;
        tracing::info!(uid, plan = %plan, "Admin changed plan");
        Ok(record)
    }

    pub fn toggle_plan(&self, uid: &str) -> Result<UserRecord> {
        let current = self
            .users
            .get(uid)?
            .ok_or_else(|| AccountError::UserNotFound(uid.to_string()))?;
        self.set_plan(uid, current.plan.toggled())
    }

    /// Give the user today's full allowance back
    pub fn reset_usage(&self, uid: &str) -> Result<UserRecord> {
        let record = self.users.reset_usage(uid)?;
        tracing::info!(uid, "Admin reset daily usage");
        Ok(record)
    }

    /// Remove the record and identity, and end the user's sessions
    pub async fn delete_user(&self, uid: &str) -> Result<DeletedUser> {
        if !self.users.delete(uid)? {
            return Err(AccountError::UserNotFound(uid.to_string()));
        }
        self.identities.remove(uid).await?;
        let revoked_sessions = self.sessions.revoke_user(uid);

        tracing::warn!(uid, sessions = revoked_sessions.len(), "Admin deleted user");
        Ok(DeletedUser { revoked_sessions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentityProvider;
    use crate::store::MemoryUserStore;
    use crate::user::Identity;
    use chat_core::{QuotaGate, SystemClock};

    struct Fixture {
        admin: AdminService,
        users: Arc<MemoryUserStore>,
        sessions: Arc<SessionStore>,
        identities: Arc<MemoryIdentityProvider>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(MemoryUserStore::new(Arc::new(SystemClock)));
        let sessions = Arc::new(SessionStore::new());
        let identities = Arc::new(MemoryIdentityProvider::new());
        Fixture {
            admin: AdminService::new(users.clone(), sessions.clone(), identities.clone()),
            users,
            sessions,
            identities,
        }
    }

    fn add(store: &MemoryUserStore, uid: &str, name: &str, email: &str) {
        store
            .ensure(
                &Identity {
                    uid: uid.into(),
                    email: Some(email.into()),
                    display_name: Some(name.into()),
                },
                false,
            )
            .unwrap();
    }

    #[test]
    fn test_filter_and_search() {
        let f = fixture();
        add(&f.users, "1", "Ada Lovelace", "ada@example.com");
        add(&f.users, "2", "Grace", "grace@navy.mil");
        add(&f.users, "3", "Linus", "LINUS@kernel.org");
        f.admin.set_plan("2", Plan::Pro).unwrap();

        let pro = f
            .admin
            .list_users(&UserFilter {
                plan: Some(Plan::Pro),
                search: None,
            })
            .unwrap();
        assert_eq!(pro.len(), 1);
        assert_eq!(pro[0].id, "2");

        let kernel = f
            .admin
            .list_users(&UserFilter {
                plan: None,
                search: Some("Kernel".into()),
            })
            .unwrap();
        assert_eq!(kernel.len(), 1);
        assert_eq!(kernel[0].id, "3");

        let by_name = f
            .admin
            .list_users(&UserFilter {
                plan: Some(Plan::Free),
                search: Some("ada".into()),
            })
            .unwrap();
        assert_eq!(by_name.len(), 1);

        assert_eq!(f.admin.list_users(&UserFilter::default()).unwrap().len(), 3);
    }

    #[test]
    fn test_toggle_and_stats() {
        let f = fixture();
        add(&f.users, "1", "Ada", "ada@example.com");
        add(&f.users, "2", "Grace", "grace@example.com");

        let toggled = f.admin.toggle_plan("1").unwrap();
        assert_eq!(toggled.plan, Plan::Pro);
        assert!(toggled.subscription_end_date.is_some());

        assert_eq!(
            f.admin.stats().unwrap(),
            UserStats {
                total_users: 2,
                pro_users: 1,
                free_users: 1
            }
        );

        assert_eq!(f.admin.toggle_plan("1").unwrap().plan, Plan::Free);
        assert!(matches!(
            f.admin.toggle_plan("missing"),
            Err(AccountError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_reset_usage() {
        let f = fixture();
        add(&f.users, "1", "Ada", "ada@example.com");
        let gate = QuotaGate::default();
        while f.users.try_consume("1", &gate).unwrap().allowed {}

        let reset = f.admin.reset_usage("1").unwrap();
        assert_eq!(reset.daily_usage, 0);
        assert!(f.users.try_consume("1", &gate).unwrap().allowed);
    }

    #[tokio::test]
    async fn test_delete_revokes_sessions() {
        let f = fixture();
        let identity = f
            .identities
            .sign_up("ada@example.com", "secret1", Some("Ada"))
            .await
            .unwrap();
        f.users.ensure(&identity, false).unwrap();
        let token = f.sessions.issue(&identity.uid);

        let deleted = f.admin.delete_user(&identity.uid).await.unwrap();
        assert_eq!(deleted.revoked_sessions, vec![token.clone()]);
        assert!(f.sessions.resolve(&token).is_err());
        assert!(f.users.get(&identity.uid).unwrap().is_none());
        assert!(f.identities.sign_in("ada@example.com", "secret1").await.is_err());

        assert!(matches!(
            f.admin.delete_user(&identity.uid).await,
            Err(AccountError::UserNotFound(_))
        ));
    }
}
