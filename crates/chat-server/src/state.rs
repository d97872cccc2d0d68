//! Application State

use std::sync::Arc;

use chat_accounts::{
    AdminService, GuestUsageTracker, IdentityProvider, MemoryIdentityProvider, MemoryUserStore,
    SessionStore, UserStore,
};
use chat_billing::{MockGateway, PaymentGateway, ReceiptSigner};
use chat_core::{Assistant, ChatStore, Clock, MemoryChatStore, QuotaGate};

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,

    /// Completion and image generation behind the provider ports
    pub assistant: Arc<Assistant>,

    pub gate: QuotaGate,

    /// User documents
    pub users: Arc<dyn UserStore>,

    pub identities: Arc<dyn IdentityProvider>,

    pub sessions: Arc<SessionStore>,

    pub guests: Arc<GuestUsageTracker>,

    /// Session-local chats
    pub chats: Arc<dyn ChatStore>,

    pub admin: Arc<AdminService>,

    pub gateway: Arc<dyn PaymentGateway>,

    /// Verifies receipts coming back from the gateway
    pub signer: ReceiptSigner,
}

impl AppState {
    /// Wire in-memory stores and the mock gateway around an assistant
    pub fn new(
        config: ServerConfig,
        assistant: Assistant,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let signer = ReceiptSigner::new(&config.payment_secret)?;
        let gateway = Arc::new(MockGateway::new(
            signer.clone(),
            config.public_url.clone(),
            config.payment_delay,
        ));

        let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new(clock.clone()));
        let identities: Arc<dyn IdentityProvider> = Arc::new(MemoryIdentityProvider::new());
        let sessions = Arc::new(SessionStore::new());
        let admin = Arc::new(AdminService::new(
            users.clone(),
            sessions.clone(),
            identities.clone(),
        ));

        Ok(Self {
            gate: QuotaGate::new(config.limits),
            guests: Arc::new(GuestUsageTracker::new(config.limits.guest_daily, clock)),
            config: Arc::new(config),
            assistant: Arc::new(assistant),
            users,
            identities,
            sessions,
            chats: Arc::new(MemoryChatStore::new()),
            admin,
            gateway,
            signer,
        })
    }
}
