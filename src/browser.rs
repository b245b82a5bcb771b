/// Browser-backed implementations of the platform seams
///
/// Extension APIs come through the small promise bridge in
/// `bridge/extension.js`; plain web APIs go straight through web-sys.
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::auth::{IdentityProvider, PageLocation};
use crate::error::{AppError, AppResult};
use crate::extractor::PageDocument;
use crate::messaging::{Destination, Message, MessageRouter, MessageTransport, RouterSlot};
use crate::session::KeyValueStore;

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge/extension.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn storageGet(area: &str, key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageSet(area: &str, key: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageRemove(area: &str, keys: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendRuntimeMessage(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendToActiveTab(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn openTab(url: &str) -> Result<(), JsValue>;

    fn closeWindow();

    #[wasm_bindgen(catch)]
    async fn getGoogleAuthToken() -> Result<JsValue, JsValue>;
}

/// Readable text for a rejected JS promise or thrown value
pub fn js_error(value: JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    match value.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => format!("{:?}", value),
    }
}

/// Plain JSON objects on the JS side (not `Map`s)
fn to_js<T: Serialize + ?Sized>(value: &T) -> AppResult<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| AppError::Messaging(format!("Failed to serialize: {:?}", e)))
}

fn from_js(value: JsValue) -> AppResult<Option<Value>> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(value)
        .map(Some)
        .map_err(|e| AppError::Messaging(format!("Failed to parse reply: {:?}", e)))
}

/// `chrome.storage.sync` or `chrome.storage.local`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromeStorage {
    area: &'static str,
}

impl ChromeStorage {
    /// Follows the user across browsers when sync is on
    pub fn sync() -> ChromeStorage {
        ChromeStorage { area: "sync" }
    }

    pub fn local() -> ChromeStorage {
        ChromeStorage { area: "local" }
    }
}

impl KeyValueStore for ChromeStorage {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        let value = storageGet(self.area, key)
            .await
            .map_err(|e| AppError::Storage(js_error(e)))?;

        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        match value.as_string() {
            Some(text) => Ok(Some(text)),
            None => {
                log::warn!("Ignoring non-string value under '{}'", key);
                Ok(None)
            }
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        storageSet(self.area, key, value)
            .await
            .map_err(|e| AppError::Storage(js_error(e)))
    }

    async fn remove_items(&self, keys: &[&str]) -> AppResult<()> {
        storageRemove(self.area, to_js(keys)?)
            .await
            .map_err(|e| AppError::Storage(js_error(e)))
    }
}

/// The tab's `sessionStorage`: survives reloads, gone when the tab closes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TabSessionStorage;

impl TabSessionStorage {
    fn storage() -> AppResult<web_sys::Storage> {
        web_sys::window()
            .ok_or_else(|| AppError::Storage("No window".to_string()))?
            .session_storage()
            .map_err(|e| AppError::Storage(js_error(e)))?
            .ok_or_else(|| AppError::Storage("sessionStorage unavailable".to_string()))
    }
}

impl KeyValueStore for TabSessionStorage {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| AppError::Storage(js_error(e)))
    }

    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| AppError::Storage(js_error(e)))
    }

    async fn remove_items(&self, keys: &[&str]) -> AppResult<()> {
        let storage = Self::storage()?;
        for key in keys {
            storage
                .remove_item(key)
                .map_err(|e| AppError::Storage(js_error(e)))?;
        }
        Ok(())
    }
}

/// `chrome.runtime.sendMessage` / `chrome.tabs.sendMessage`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChromeMessenger;

impl MessageTransport for ChromeMessenger {
    async fn send(&self, destination: Destination, message: &Message) -> AppResult<Option<Value>> {
        let payload = to_js(message)?;

        let reply = match destination {
            Destination::Runtime => sendRuntimeMessage(payload).await,
            Destination::ActiveTab => sendToActiveTab(payload).await,
        }
        .map_err(|e| AppError::Messaging(js_error(e)))?;

        from_js(reply)
    }
}

thread_local! {
    static ROUTER: Rc<RouterSlot> = Rc::new(RouterSlot::new());
}

/// Make `router` the receiver for this context's incoming messages
pub fn install_router(router: MessageRouter) {
    ROUTER.with(|slot| slot.install(router));
}

/// Answer one incoming message. The loader registers its
/// `chrome.runtime.onMessage` listener before the module is ready and
/// forwards here, so a message that woke the context waits for the router.
pub fn dispatch_message(raw: JsValue) -> js_sys::Promise {
    let slot = ROUTER.with(Rc::clone);
    wasm_bindgen_futures::future_to_promise(async move {
        let message = from_js(raw).ok().flatten().unwrap_or(Value::Null);
        let reply = match slot.dispatch(message).await {
            Some(reply) => to_js(&reply).unwrap_or(JsValue::UNDEFINED),
            None => JsValue::UNDEFINED,
        };
        Ok(reply)
    })
}

/// `chrome.identity.getAuthToken({ interactive: true })`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChromeIdentity;

impl IdentityProvider for ChromeIdentity {
    async fn access_token(&self) -> AppResult<String> {
        let token = getGoogleAuthToken()
            .await
            .map_err(|e| AppError::Transport(js_error(e)))?;

        token
            .as_string()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Transport("No access token was granted.".to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BrowserLocation;

impl PageLocation for BrowserLocation {
    fn href(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default()
    }

    fn replace(&self, url: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let replaced = window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(url)));
        if let Err(e) = replaced {
            log::error!("Could not rewrite the address bar: {}", js_error(e));
        }
    }
}

/// Path of the current page, e.g. `/reset-password/abc`
pub fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_default()
}

/// The live DOM of the page a content script runs in
#[derive(Debug, Clone)]
pub struct WebPage {
    document: web_sys::Document,
}

impl WebPage {
    pub fn current() -> Option<WebPage> {
        let document = web_sys::window()?.document()?;
        Some(WebPage { document })
    }
}

impl PageDocument for WebPage {
    fn select_texts(&self, selector: &str) -> Vec<String> {
        let Ok(nodes) = self.document.query_selector_all(selector) else {
            log::warn!("Bad selector {}", selector);
            return Vec::new();
        };

        (0..nodes.length())
            .filter_map(|i| nodes.get(i))
            .filter_map(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
            .map(|element| element.inner_text())
            .collect()
    }

    fn body_text(&self) -> Option<String> {
        self.document.body().map(|body| body.inner_text())
    }

    fn outer_html(&self) -> String {
        self.document
            .document_element()
            .map(|root| root.outer_html())
            .unwrap_or_default()
    }
}

pub async fn open_tab(url: &str) -> AppResult<()> {
    openTab(url)
        .await
        .map_err(|e| AppError::Messaging(js_error(e)))
}

pub fn close_window() {
    closeWindow();
}
