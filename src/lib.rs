//! # medqa-client
//!
//! Leptos + WASM browser client for the medical Q&A service.
//!
//! The crate owns three cooperating pieces: the session manager
//! (`state::session`), the route guard (`routing` plus
//! `components::guarded`), and the HTTP gateway (`net::gateway`). Pages and
//! components sit on top of them. Everything outside the `csr` feature builds
//! and tests natively.

pub mod app;
pub mod components;
pub mod config;
pub mod net;
pub mod pages;
pub mod routing;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_support;

/// WASM entry point: install logging and mount the app.
#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let config = config::ApiConfig::from_build_env();
    if let Err(e) = console_log::init_with_level(config.log_level) {
        web_sys::console::error_1(&format!("logger init failed: {e}").into());
    }
    log::info!("medqa-client starting against {}", config.base_url);
    leptos::mount::mount_to_body(app::App);
}
