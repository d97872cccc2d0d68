//! Admin Dashboard

use leptos::prelude::*;

use crate::api::{self, User, UserStats};
use crate::session::use_session;

#[component]
pub fn AdminPage() -> impl IntoView {
    let session = use_session();

    let users = RwSignal::new(Vec::<User>::new());
    let stats = RwSignal::new(UserStats::default());
    let (plan, set_plan) = signal(String::from("all"));
    let (search, set_search) = signal(String::new());
    let (error, set_error) = signal(None::<String>);

    let reload = move || {
        let (plan, search) = (plan.get_untracked(), search.get_untracked());
        leptos::task::spawn_local(async move {
            match api::admin_users(&plan, &search).await {
                Ok(list) => users.set(list),
                Err(e) => set_error.set(Some(e.to_string())),
            }
            if let Ok(s) = api::admin_stats().await {
                stats.set(s);
            }
        });
    };

    Effect::new(move |_| {
        plan.track();
        search.track();
        if session.is_admin() {
            reload();
        }
    });

    let toggle = move |uid: String| {
        leptos::task::spawn_local(async move {
            match api::admin_toggle_plan(&uid).await {
                Ok(_) => reload(),
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    let remove = move |uid: String| {
        let confirmed = web_sys::window()
            .and_then(|w| w.confirm_with_message("Delete this user and all their data?").ok())
            .unwrap_or(false);
        if !confirmed {
            return;
        }
        leptos::task::spawn_local(async move {
            match api::admin_delete_user(&uid).await {
                Ok(()) => reload(),
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    view! {
        <Show
            when=move || session.is_admin()
            fallback=|| view! {
                <div class="forbidden">
                    <h1>"Admins only"</h1>
                    <a href="/" class="btn">"Back to chat"</a>
                </div>
            }
        >
            <div class="admin">
                <h1>"Users"</h1>
                <div class="stats">
                    <div class="stat"><span>"Total"</span><strong>{move || stats.get().total_users}</strong></div>
                    <div class="stat"><span>"Pro"</span><strong>{move || stats.get().pro_users}</strong></div>
                    <div class="stat"><span>"Free"</span><strong>{move || stats.get().free_users}</strong></div>
                </div>

                <div class="filters">
                    <select on:change=move |ev| set_plan.set(event_target_value(&ev))>
                        <option value="all">"All plans"</option>
                        <option value="free">"Free"</option>
                        <option value="pro">"Pro"</option>
                    </select>
                    <input
                        type="search"
                        placeholder="Search name or email"
                        prop:value=move || search.get()
                        on:input=move |ev| set_search.set(event_target_value(&ev))
                    />
                </div>
                {move || error.get().map(|e| view! { <p class="error">{e}</p> })}

                <table>
                    <thead>
                        <tr>
                            <th>"Name"</th>
                            <th>"Email"</th>
                            <th>"Plan"</th>
                            <th>"Today"</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=move || users.get()
                            key=|u| (u.id.clone(), u.plan.clone(), u.daily_usage)
                            children=move |u| {
                                let toggle_id = u.id.clone();
                                let delete_id = u.id.clone();
                                let label = if u.is_pro() { "Make free" } else { "Make pro" };
                                view! {
                                    <tr>
                                        <td>{u.name}</td>
                                        <td>{u.email.unwrap_or_default()}</td>
                                        <td class=format!("plan plan-{}", u.plan)>{u.plan.clone()}</td>
                                        <td>{u.daily_usage}</td>
                                        <td>
                                            <button class="btn" on:click=move |_| toggle(toggle_id.clone())>{label}</button>
                                            <button class="btn danger" on:click=move |_| remove(delete_id.clone())>"Delete"</button>
                                        </td>
                                    </tr>
                                }
                            }
                        />
                    </tbody>
                </table>
            </div>
        </Show>
    }
}
