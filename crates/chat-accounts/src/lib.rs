//! # chat-accounts
//!
//! Who is talking and how much they may say: identity, bearer sessions, user
//! records with daily usage, guest counters and admin operations.
//!
//! The identity service and the user document store are external in
//! production. Both sit behind traits (`IdentityProvider`, `UserStore`) with
//! in-memory implementations for development and tests.
//!
//! ## Quota accounting
//!
//! `UserStore::try_consume` and `GuestUsageTracker::try_increment` check the
//! limit and count the message under one write lock, so concurrent sessions of
//! the same account cannot both spend the last message of the day.

pub mod admin;
pub mod error;
pub mod guest;
pub mod identity;
pub mod session;
pub mod store;
pub mod user;

pub use admin::{AdminService, DeletedUser, UserFilter, UserStats};
pub use error::{AccountError, Result};
pub use guest::{GuestUsage, GuestUsageTracker};
pub use identity::{IdentityProvider, MemoryIdentityProvider};
pub use session::SessionStore;
pub use store::{MemoryUserStore, UserStore};
pub use user::{Identity, UserRecord};
