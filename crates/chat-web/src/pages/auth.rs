//! Sign-in / Sign-up Page

use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::api;
use crate::session::use_session;

#[component]
pub fn AuthPage() -> impl IntoView {
    let session = use_session();
    let navigate = use_navigate();

    let (register, set_register) = signal(false);
    let (name, set_name) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal(None::<String>);
    let (busy, set_busy) = signal(false);

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        set_busy.set(true);
        set_error.set(None);

        let navigate = navigate.clone();
        let (name, email, password) = (name.get_untracked(), email.get_untracked(), password.get_untracked());
        let registering = register.get_untracked();

        leptos::task::spawn_local(async move {
            let result = if registering {
                api::register(&email, &password, &name).await
            } else {
                api::login(&email, &password).await
            };

            match result {
                Ok(auth) => {
                    session.signed_in(auth);
                    navigate("/", Default::default());
                }
                Err(e) => set_error.set(Some(e.to_string())),
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="auth">
            <h1>{move || if register.get() { "Create account" } else { "Sign in" }}</h1>
            <form on:submit=submit>
                <Show when=move || register.get()>
                    <label>"Name"</label>
                    <input
                        type="text"
                        prop:value=move || name.get()
                        on:input=move |ev| set_name.set(event_target_value(&ev))
                    />
                </Show>
                <label>"Email"</label>
                <input
                    type="email"
                    required
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
                <label>"Password"</label>
                <input
                    type="password"
                    required
                    minlength="6"
                    prop:value=move || password.get()
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                />
                {move || error.get().map(|e| view! { <p class="error">{e}</p> })}
                <button type="submit" class="btn btn-primary" disabled=move || busy.get()>
                    {move || if register.get() { "Sign up" } else { "Sign in" }}
                </button>
            </form>
            <button class="link" on:click=move |_| set_register.update(|r| *r = !*r)>
                {move || if register.get() {
                    "Already have an account? Sign in"
                } else {
                    "No account yet? Sign up"
                }}
            </button>
            <a href="/" class="link">"Continue as guest"</a>
        </div>
    }
}
