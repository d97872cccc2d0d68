//! Page Components

mod admin;
mod auth;
mod chat;
mod payment;
mod pricing;

pub use admin::AdminPage;
pub use auth::AuthPage;
pub use chat::ChatPage;
pub use payment::{PaymentPage, SuccessPage};
pub use pricing::PricingPage;
