/// Echo Escape - article analysis browser extension and web dashboard
/// Built with Rust + WASM + Yew

pub mod analysis;
pub mod api;
pub mod auth;
pub mod browser;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod extractor;
pub mod inflight;
pub mod messaging;
pub mod model;
pub mod session;
pub mod state;
pub mod ui;

#[cfg(test)]
mod testing;

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::browser::{ChromeMessenger, ChromeStorage, WebPage};
use crate::config::Config;
use crate::session::{EXTENSION_KEYS, SessionStore};

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Background context: relays page-content requests and stores announced sessions
#[wasm_bindgen]
pub fn start_background() {
    let sessions = SessionStore::new(ChromeStorage::sync(), EXTENSION_KEYS);
    let router = messaging::background_router(Rc::new(ChromeMessenger), Rc::new(sessions));
    browser::install_router(router);
    log::info!("Background router ready");
}

// Entry point for the loaders' `chrome.runtime.onMessage` listeners
#[wasm_bindgen]
pub fn handle_message(message: JsValue) -> js_sys::Promise {
    browser::dispatch_message(message)
}

// Content script: answers page-content requests from the live document
#[wasm_bindgen]
pub fn start_content_script() {
    let Some(page) = WebPage::current() else {
        log::error!("Content script loaded without a document");
        return;
    };

    spawn_local(async move {
        let config = Config::load(&ChromeStorage::local()).await;
        browser::install_router(messaging::content_router(Rc::new(page), config.min_content_chars));
        log::debug!("Content router ready");
    });
}

// Extract the current page the way the content script would
#[wasm_bindgen]
pub fn extract_page_content() -> Result<JsValue, JsValue> {
    let page = WebPage::current().ok_or_else(|| JsValue::from_str("No document"))?;
    let content = extractor::extract_with_defaults(&page);

    serde_wasm_bindgen::to_value(&content).map_err(|e| JsValue::from_str(&format!("Failed to serialize: {:?}", e)))
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Start the Yew app for the OAuth callback page
#[wasm_bindgen]
pub fn start_oauth_callback() {
    yew::Renderer::<ui::oauth_callback::OAuthCallback>::new().render();
}

// Start the Yew app for the web dashboard
#[wasm_bindgen]
pub fn start_dashboard() {
    yew::Renderer::<ui::dashboard::DashboardApp>::new().render();
}
