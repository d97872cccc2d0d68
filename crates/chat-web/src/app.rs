//! Main App Component

use leptos::prelude::*;
use leptos_router::{components::*, path};

use crate::pages::{AdminPage, AuthPage, ChatPage, PaymentPage, PricingPage, SuccessPage};
use crate::session::Session;

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    let session = Session::new();
    provide_context(session);
    session.refresh();

    view! {
        <Router>
            <main class="app">
                <Routes fallback=|| view! { <p>"Page not found"</p> }>
                    <Route path=path!("/") view=ChatPage />
                    <Route path=path!("/auth") view=AuthPage />
                    <Route path=path!("/pricing") view=PricingPage />
                    <Route path=path!("/payment") view=PaymentPage />
                    <Route path=path!("/success") view=SuccessPage />
                    <Route path=path!("/admin") view=AdminPage />
                </Routes>
            </main>
        </Router>
    }
}
