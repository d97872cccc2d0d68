//! Pricing Page

use leptos::prelude::*;

use crate::api::{self, SubscriptionPlan};
use crate::session::use_session;

#[component]
pub fn PricingPage() -> impl IntoView {
    let session = use_session();
    let plans = LocalResource::new(api::plans);
    let (error, set_error) = signal(None::<String>);

    let subscribe = move |plan_id: String| {
        if !session.is_signed_in() {
            go_to("/auth");
            return;
        }
        leptos::task::spawn_local(async move {
            match api::create_payment(&plan_id).await {
                Ok(payment) => go_to(&payment.payment_page_url),
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    let cancel = move |_| {
        leptos::task::spawn_local(async move {
            match api::cancel_subscription().await {
                Ok(user) => session.user.set(Some(user)),
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    let plan_card = move |plan: SubscriptionPlan| {
        let id = plan.id.clone();
        let featured = plan.id == "yearly";
        view! {
            <div class="plan" class:featured=featured>
                <h2>{plan.name}</h2>
                <div class="price">
                    {format!("{} {}", plan.price, plan.currency)}
                    <span>{format!("/{}", if plan.period == "yearly" { "year" } else { "month" })}</span>
                </div>
                {plan.original_price.map(|p| view! { <s class="original">{format!("{p} {}", plan.currency)}</s> })}
                {plan.discount.map(|d| view! { <span class="badge">{format!("Save {d} {}", plan.currency)}</span> })}
                <ul>
                    {plan.features.into_iter().map(|f| view! { <li>{f}</li> }).collect_view()}
                </ul>
                <button class="btn btn-primary" on:click=move |_| subscribe(id.clone())>
                    "Subscribe"
                </button>
            </div>
        }
    };

    view! {
        <div class="pricing">
            <h1>"Upgrade to Pro"</h1>
            <p class="subtitle">"Unlimited messages and image generation"</p>
            {move || error.get().map(|e| view! { <p class="error">{e}</p> })}

            <Show
                when=move || !session.is_pro()
                fallback=move || view! {
                    <div class="current-plan">
                        <p>{move || session.user.with(|u| match u.as_ref().and_then(|u| u.subscription_end_date) {
                            Some(end) => format!("You're on Pro until {}", end.format("%Y-%m-%d")),
                            None => "You're on Pro".to_string(),
                        })}</p>
                        <Show when=move || session.user.with(|u| u.as_ref().is_some_and(|u| u.subscription_status == "active"))>
                            <button class="btn" on:click=cancel>"Cancel subscription"</button>
                        </Show>
                    </div>
                }
            >
                <div class="plans">
                    <div class="plan">
                        <h2>"Free"</h2>
                        <div class="price">"0"<span>"/month"</span></div>
                        <ul>
                            <li>"20 messages a day"</li>
                            <li>"Chat history for your session"</li>
                        </ul>
                        <a href="/" class="btn">"Keep chatting"</a>
                    </div>
                    <Suspense fallback=|| view! { <p>"Loading plans..."</p> }>
                        {move || plans.get().map(|result| match result.take() {
                            Ok(list) => list.into_iter().map(plan_card).collect_view().into_any(),
                            Err(e) => view! { <p class="error">{e.to_string()}</p> }.into_any(),
                        })}
                    </Suspense>
                </div>
            </Show>
        </div>
    }
}

fn go_to(url: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(url);
    }
}
