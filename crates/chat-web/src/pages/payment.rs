//! Payment and Success Pages

use leptos::prelude::*;
use leptos_router::hooks::{use_navigate, use_query_map};

use crate::api::{self, CardForm};
use crate::session::use_session;

#[component]
pub fn PaymentPage() -> impl IntoView {
    let session = use_session();
    let navigate = use_navigate();
    let query = use_query_map();
    let token = move || query.with(|q| q.get("token").unwrap_or_default());

    let details = LocalResource::new(move || {
        let token = token();
        async move { api::payment_details(&token).await }
    });

    let card = RwSignal::new(CardForm::default());
    let (error, set_error) = signal(None::<String>);
    let (busy, set_busy) = signal(false);

    let pay = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        set_busy.set(true);
        set_error.set(None);

        let navigate = navigate.clone();
        let token = token();
        let form = card.get_untracked();

        leptos::task::spawn_local(async move {
            match api::complete_payment(&token, &form).await {
                Ok(done) if done.success => {
                    session.user.set(Some(done.user));
                    navigate("/success", Default::default());
                }
                Ok(_) => set_error.set(Some("Payment was not completed".into())),
                Err(e) => set_error.set(Some(e.to_string())),
            }
            set_busy.set(false);
        });
    };

    let field = move |label: &'static str, placeholder: &'static str, get: fn(&CardForm) -> String, set: fn(&mut CardForm, String)| {
        view! {
            <label>{label}</label>
            <input
                type="text"
                placeholder=placeholder
                prop:value=move || card.with(get)
                on:input=move |ev| card.update(|c| set(c, event_target_value(&ev)))
            />
        }
    };

    view! {
        <div class="payment">
            <h1>"Complete your purchase"</h1>
            <Suspense fallback=|| view! { <p>"Loading..."</p> }>
                {move || details.get().map(|result| match result.take() {
                    Ok(d) => view! {
                        <div class="summary">
                            <h2>{d.plan.name}</h2>
                            <p class="price">{format!("{} {}", d.plan.price, d.plan.currency)}</p>
                        </div>
                    }.into_any(),
                    Err(e) => view! {
                        <p class="error">{e.to_string()}</p>
                        <a href="/pricing" class="btn">"Back to plans"</a>
                    }.into_any(),
                })}
            </Suspense>

            <form on:submit=pay>
                {field("Card number", "4242 4242 4242 4242", |c| c.card_number.clone(), |c, v| c.card_number = v)}
                {field("Expiry month", "MM", |c| c.expiry_month.clone(), |c, v| c.expiry_month = v)}
                {field("Expiry year", "YY", |c| c.expiry_year.clone(), |c, v| c.expiry_year = v)}
                {field("CVC", "123", |c| c.cvc.clone(), |c, v| c.cvc = v)}
                {field("Card holder", "Name on card", |c| c.card_holder_name.clone(), |c, v| c.card_holder_name = v)}
                {move || error.get().map(|e| view! { <p class="error">{e}</p> })}
                <button type="submit" class="btn btn-primary" disabled=move || busy.get()>
                    {move || if busy.get() { "Processing..." } else { "Pay" }}
                </button>
            </form>
            <p class="hint">"Test mode: no real card is charged."</p>
        </div>
    }
}

#[component]
pub fn SuccessPage() -> impl IntoView {
    let session = use_session();
    session.refresh();

    view! {
        <div class="success">
            <h1>"Welcome to Pro!"</h1>
            <p>"Your subscription is active. Enjoy unlimited messages and image generation."</p>
            {move || session.user.with(|u| u.as_ref().and_then(|u| u.subscription_end_date).map(|end| view! {
                <p class="hint">{format!("Renews on {}", end.format("%Y-%m-%d"))}</p>
            }))}
            <a href="/" class="btn btn-primary">"Start chatting"</a>
        </div>
    }
}
