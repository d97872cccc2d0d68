//! UI Components

use leptos::prelude::*;

use crate::api::Message;
use crate::session::use_session;

/// Message bubble component
#[component]
pub fn MessageBubble(message: Message) -> impl IntoView {
    let class = format!("message message-{}", message.role);
    let time = message.timestamp.format("%H:%M").to_string();

    view! {
        <div class=class>
            <p class="content">{message.content.clone()}</p>
            {message.image_url.clone().map(|url| view! {
                <img class="generated" src=url alt="Generated image" />
            })}
            <span class="time">{time}</span>
        </div>
    }
}

/// Today's usage, e.g. "3 / 20 messages" or "Pro: unlimited"
#[component]
pub fn UsageBadge() -> impl IntoView {
    let session = use_session();

    let label = move || {
        if session.is_pro() {
            return "Pro · unlimited".to_string();
        }
        if session.is_signed_in() {
            return session.quota.with(|q| match q.as_ref().and_then(|q| q.limit.map(|l| (q.used, l))) {
                Some((used, limit)) => format!("{used} / {limit} messages today"),
                None => String::new(),
            });
        }
        session.guest.with(|g| match g {
            Some(g) => format!("Guest · {} / {} messages", g.used, g.limit),
            None => String::new(),
        })
    };

    view! { <span class="usage-badge">{label}</span> }
}

/// Shown when the daily limit is reached
#[component]
pub fn UpgradePrompt() -> impl IntoView {
    let session = use_session();

    view! {
        <div class="upgrade-prompt">
            <Show
                when=move || session.is_signed_in()
                fallback=|| view! {
                    <h3>"You've used your free guest messages"</h3>
                    <p>"Sign up for 20 free messages a day, or go Pro for unlimited chat and image generation."</p>
                    <a href="/auth" class="btn btn-primary">"Sign up free"</a>
                }
            >
                <h3>"Daily limit reached"</h3>
                <p>"Your messages reset tomorrow. Pro gives you unlimited messages and image generation."</p>
            </Show>
            <a href="/pricing" class="btn">"See Pro plans"</a>
        </div>
    }
}
