//! sai-chat Web Frontend
//!
//! Leptos-based WASM frontend: chat, sign-in, pricing, checkout and the
//! admin dashboard.

mod api;
mod app;
mod components;
mod pages;
mod session;

pub use app::App;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
