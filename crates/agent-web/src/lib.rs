//! market-agents Web Frontend
//!
//! Leptos-based WASM query form: pick a mode, ask a question, read the
//! answer and the tools the agents used.

mod app;
mod pages;
mod components;
mod api;
mod markdown;

pub use app::App;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
