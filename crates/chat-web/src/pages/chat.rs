//! Chat Page

use leptos::prelude::*;

use crate::api::{self, Chat};
use crate::components::{MessageBubble, UpgradePrompt, UsageBadge};
use crate::session::use_session;

#[component]
pub fn ChatPage() -> impl IntoView {
    let session = use_session();

    let chats = RwSignal::new(Vec::<Chat>::new());
    let active = RwSignal::new(None::<String>);
    let (input, set_input) = signal(String::new());
    let (image_mode, set_image_mode) = signal(false);
    let (loading, set_loading) = signal(false);
    let (error, set_error) = signal(None::<String>);
    let (degraded, set_degraded) = signal(false);
    let (limit_reached, set_limit_reached) = signal(false);

    let load_chats = move || {
        leptos::task::spawn_local(async move {
            match api::list_chats().await {
                Ok(list) => {
                    if active.get_untracked().is_none() {
                        active.set(list.first().map(|c| c.id.clone()));
                    }
                    chats.set(list);
                }
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    // Reload chats whenever the signed-in account changes
    Effect::new(move |_| {
        session.user.track();
        active.set(None);
        load_chats();
    });

    let messages = move || {
        let id = active.get();
        chats.with(|list| {
            list.iter()
                .find(|c| Some(&c.id) == id.as_ref())
                .map(|c| c.messages.clone())
                .unwrap_or_default()
        })
    };

    let new_chat = move |_| {
        leptos::task::spawn_local(async move {
            match api::create_chat().await {
                Ok(chat) => {
                    active.set(Some(chat.id.clone()));
                    chats.update(|list| list.insert(0, chat));
                }
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    let delete_chat = move |id: String| {
        leptos::task::spawn_local(async move {
            if api::delete_chat(&id).await.is_ok() {
                chats.update(|list| list.retain(|c| c.id != id));
                if active.get_untracked().as_deref() == Some(id.as_str()) {
                    active.set(chats.with_untracked(|list| list.first().map(|c| c.id.clone())));
                }
            }
        });
    };

    let rename_chat = move |id: String, current: String| {
        let title = web_sys::window()
            .and_then(|w| w.prompt_with_message_and_default("Rename chat", &current).ok())
            .flatten()
            .filter(|t| !t.trim().is_empty());
        let Some(title) = title else { return };

        leptos::task::spawn_local(async move {
            match api::rename_chat(&id, &title).await {
                Ok(renamed) => chats.update(|list| {
                    if let Some(chat) = list.iter_mut().find(|c| c.id == renamed.id) {
                        chat.title = renamed.title;
                    }
                }),
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    let send = move || {
        let content = input.get_untracked().trim().to_string();
        if content.is_empty() || loading.get_untracked() {
            return;
        }
        let image = image_mode.get_untracked() && session.is_pro();

        set_input.set(String::new());
        set_loading.set(true);
        set_error.set(None);

        leptos::task::spawn_local(async move {
            let chat_id = match active.get_untracked() {
                Some(id) => id,
                None => match api::create_chat().await {
                    Ok(chat) => {
                        let id = chat.id.clone();
                        chats.update(|list| list.insert(0, chat));
                        active.set(Some(id.clone()));
                        id
                    }
                    Err(e) => {
                        set_error.set(Some(e.to_string()));
                        set_loading.set(false);
                        return;
                    }
                },
            };

            match api::send_message(&chat_id, &content, image).await {
                Ok(sent) => {
                    set_degraded.set(sent.degraded);
                    set_limit_reached.set(!sent.quota.allowed);
                    session.update_quota(sent.quota);
                    chats.update(|list| {
                        if let Some(chat) = list.iter_mut().find(|c| c.id == chat_id) {
                            if chat.messages.is_empty() {
                                chat.title = title_preview(&content);
                            }
                            chat.messages.push(sent.user_message);
                            chat.messages.push(sent.assistant_message);
                        }
                    });
                }
                Err(e) if e.is_quota() => {
                    set_limit_reached.set(true);
                    set_input.set(content);
                    session.refresh();
                }
                Err(e) => {
                    set_error.set(Some(e.to_string()));
                    set_input.set(content);
                }
            }
            set_loading.set(false);
        });
    };

    view! {
        <div class="chat">
            <aside class="sidebar">
                <button class="btn btn-primary" on:click=new_chat>"+ New chat"</button>
                <ul class="chat-list">
                    <For
                        each=move || chats.get()
                        key=|chat| (chat.id.clone(), chat.title.clone())
                        children=move |chat| {
                            let id = chat.id.clone();
                            let select_id = id.clone();
                            let delete_id = id.clone();
                            let rename_id = id.clone();
                            let title = chat.title;
                            let current = title.clone();
                            let is_active = move || active.get().as_deref() == Some(id.as_str());
                            view! {
                                <li class:active=is_active>
                                    <span on:click=move |_| active.set(Some(select_id.clone()))>
                                        {title}
                                    </span>
                                    <button class="icon" on:click=move |_| rename_chat(rename_id.clone(), current.clone())>"✎"</button>
                                    <button class="icon" on:click=move |_| delete_chat(delete_id.clone())>"×"</button>
                                </li>
                            }
                        }
                    />
                </ul>

                <div class="account">
                    <UsageBadge />
                    <Show
                        when=move || session.is_signed_in()
                        fallback=|| view! { <a href="/auth" class="btn">"Sign in"</a> }
                    >
                        <Show when=move || session.is_admin()>
                            <a href="/admin" class="btn">"Admin"</a>
                        </Show>
                        <Show when=move || !session.is_pro()>
                            <a href="/pricing" class="btn">"Go Pro"</a>
                        </Show>
                        <button class="btn" on:click=move |_| session.sign_out()>"Sign out"</button>
                    </Show>
                </div>
            </aside>

            <section class="chat-main">
                <div class="messages">
                    <For
                        each=messages
                        key=|msg| msg.id.clone()
                        children=move |msg| view! { <MessageBubble message=msg /> }
                    />
                    <Show when=move || loading.get()>
                        <div class="message loading">"..."</div>
                    </Show>
                </div>

                <Show when=move || degraded.get()>
                    <p class="notice">"The assistant is having trouble right now; this reply is a fallback."</p>
                </Show>
                {move || error.get().map(|e| view! { <p class="error">{e}</p> })}
                <Show when=move || limit_reached.get() || !session.can_send()>
                    <UpgradePrompt />
                </Show>

                <div class="input-area">
                    <Show when=move || session.is_pro()>
                        <label class="image-toggle">
                            <input
                                type="checkbox"
                                prop:checked=move || image_mode.get()
                                on:change=move |ev| set_image_mode.set(event_target_checked(&ev))
                            />
                            "Image"
                        </label>
                    </Show>
                    <textarea
                        placeholder=move || if image_mode.get() { "Describe an image..." } else { "Ask anything..." }
                        prop:value=move || input.get()
                        on:input=move |ev| set_input.set(event_target_value(&ev))
                        on:keydown=move |ev| {
                            if ev.key() == "Enter" && !ev.shift_key() {
                                ev.prevent_default();
                                send();
                            }
                        }
                    />
                    <button
                        on:click=move |_| send()
                        disabled=move || loading.get() || !session.can_send()
                    >
                        {move || if loading.get() { "..." } else { "Send" }}
                    </button>
                </div>
            </section>
        </div>
    }
}

/// Same preview the server uses for a chat's first message
fn title_preview(content: &str) -> String {
    let preview: String = content.chars().take(30).collect();
    if content.chars().count() > 30 {
        format!("{preview}...")
    } else {
        preview
    }
}
