//! Session Context
//!
//! Who is using the app and how much of today's quota is left. Provided once
//! at the root and read by every page.

use leptos::prelude::*;

use crate::api::{self, AuthResponse, GuestUsage, Quota, User};

#[derive(Clone, Copy)]
pub struct Session {
    pub user: RwSignal<Option<User>>,
    pub quota: RwSignal<Option<Quota>>,
    pub guest: RwSignal<Option<GuestUsage>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            user: RwSignal::new(None),
            quota: RwSignal::new(None),
            guest: RwSignal::new(None),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.with(Option::is_some)
    }

    pub fn is_pro(&self) -> bool {
        self.user.with(|u| u.as_ref().is_some_and(User::is_pro))
    }

    pub fn is_admin(&self) -> bool {
        self.user.with(|u| u.as_ref().is_some_and(|u| u.is_admin))
    }

    /// Reload the account (or guest usage) from the server
    pub fn refresh(self) {
        leptos::task::spawn_local(async move {
            if api::stored_token().is_some() {
                match api::me().await {
                    Ok(me) => {
                        self.user.set(Some(me.user));
                        self.quota.set(Some(me.quota));
                        return;
                    }
                    Err(e) => leptos::logging::warn!("session check failed: {e}"),
                }
            }
            self.user.set(None);
            self.quota.set(None);
            self.guest.set(Some(api::guest_usage().await));
        });
    }

    pub fn signed_in(&self, auth: AuthResponse) {
        self.user.set(Some(auth.user));
        self.quota.set(Some(auth.quota));
        self.guest.set(None);
    }

    /// Record the quota position the server reported after a send
    pub fn update_quota(&self, quota: Quota) {
        if self.is_signed_in() {
            self.user.update(|u| {
                if let Some(u) = u {
                    u.daily_usage = quota.used;
                }
            });
            self.quota.set(Some(quota));
        } else {
            api::remember_guest_usage(quota.used);
            self.guest.set(Some(GuestUsage {
                used: quota.used,
                limit: quota.limit.unwrap_or_default(),
                can_send: quota.allowed,
            }));
        }
    }

    pub fn sign_out(self) {
        leptos::task::spawn_local(async move {
            api::logout().await;
            self.refresh();
        });
    }

    /// Can the current user send another message right now?
    pub fn can_send(&self) -> bool {
        if self.is_signed_in() {
            self.quota.with(|q| q.is_none_or(|q| q.allowed))
        } else {
            self.guest.with(|g| g.is_none_or(|g| g.can_send))
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

pub fn use_session() -> Session {
    use_context::<Session>().unwrap_or_default()
}
