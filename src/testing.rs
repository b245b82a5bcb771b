/// In-memory stand-ins for the browser seams, shared by unit tests
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use reqwest::Method;
use serde_json::Value;

use crate::api::{ApiRequest, ApiResponse, HttpTransport};
use crate::auth::{IdentityProvider, PageLocation};
use crate::error::{AppError, AppResult};
use crate::extractor::PageDocument;
use crate::messaging::{Destination, Message, MessageTransport};
use crate::model::AnalysisResult;
use crate::session::KeyValueStore;

pub fn response(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: body.to_string(),
    }
}

pub fn sample_result() -> AnalysisResult {
    AnalysisResult {
        title: "Budget vote".to_string(),
        author: Some("A. Writer".to_string()),
        publisher: None,
        publish_date: None,
        url: Some("https://news.example.org/budget".to_string()),
        sentiment: 0.42,
        keywords: vec!["budget".to_string(), "vote".to_string()],
        article_text: None,
        category: Some("Politics".to_string()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.value(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.insert(key, value);
        Ok(())
    }

    async fn remove_items(&self, keys: &[&str]) -> AppResult<()> {
        let mut items = self.items.borrow_mut();
        for key in keys {
            items.remove(*key);
        }
        Ok(())
    }
}

/// Answers by (method, path); a route keeps answering the same way until re-scripted.
/// Every request is recorded, including ones that fail.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    routes: Rc<RefCell<HashMap<(Method, String), AppResult<ApiResponse>>>>,
    requests: Rc<RefCell<Vec<ApiRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, response: ApiResponse) {
        self.routes
            .borrow_mut()
            .insert((method, path.to_string()), Ok(response));
    }

    pub fn fail(&self, method: Method, path: &str, reason: &str) {
        self.routes
            .borrow_mut()
            .insert((method, path.to_string()), Err(AppError::Transport(reason.to_string())));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let key = (request.method.clone(), request.path.clone());
        self.requests.borrow_mut().push(request);

        self.routes
            .borrow()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(AppError::Transport(format!("no route for {} {}", key.0, key.1))))
    }
}

/// Message transport with one canned outcome
#[derive(Debug, Clone)]
pub struct FakeMessenger {
    outcome: AppResult<Option<Value>>,
    sent: Rc<RefCell<Vec<(Destination, Message)>>>,
}

impl FakeMessenger {
    pub fn replying(reply: Value) -> Self {
        Self::with_outcome(Ok(Some(reply)))
    }

    pub fn silent() -> Self {
        Self::with_outcome(Ok(None))
    }

    pub fn failing(reason: &str) -> Self {
        Self::with_outcome(Err(AppError::Messaging(reason.to_string())))
    }

    fn with_outcome(outcome: AppResult<Option<Value>>) -> Self {
        FakeMessenger {
            outcome,
            sent: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn sent(&self) -> Vec<(Destination, Message)> {
        self.sent.borrow().clone()
    }
}

impl MessageTransport for FakeMessenger {
    async fn send(&self, destination: Destination, message: &Message) -> AppResult<Option<Value>> {
        self.sent.borrow_mut().push((destination, message.clone()));
        self.outcome.clone()
    }
}

#[derive(Debug)]
pub struct RecordingLocation {
    href: RefCell<String>,
    replacements: RefCell<Vec<String>>,
}

impl RecordingLocation {
    pub fn new(href: &str) -> Self {
        RecordingLocation {
            href: RefCell::new(href.to_string()),
            replacements: RefCell::new(Vec::new()),
        }
    }

    pub fn replacements(&self) -> Vec<String> {
        self.replacements.borrow().clone()
    }
}

impl PageLocation for RecordingLocation {
    fn href(&self) -> String {
        self.href.borrow().clone()
    }

    fn replace(&self, url: &str) {
        *self.href.borrow_mut() = url.to_string();
        self.replacements.borrow_mut().push(url.to_string());
    }
}

pub struct FakeIdentity {
    outcome: AppResult<String>,
}

impl FakeIdentity {
    pub fn granting(token: &str) -> Self {
        FakeIdentity {
            outcome: Ok(token.to_string()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        FakeIdentity {
            outcome: Err(AppError::Transport(reason.to_string())),
        }
    }
}

impl IdentityProvider for FakeIdentity {
    async fn access_token(&self) -> AppResult<String> {
        self.outcome.clone()
    }
}

/// A page described by what each selector matches, in document order
#[derive(Debug, Clone, Default)]
pub struct FixturePage {
    html: String,
    matches: Vec<(String, String)>,
    body: Option<String>,
}

impl FixturePage {
    pub fn new(html: &str) -> Self {
        FixturePage {
            html: html.to_string(),
            ..Default::default()
        }
    }

    pub fn with(mut self, selector: &str, text: &str) -> Self {
        self.matches.push((selector.to_string(), text.to_string()));
        self
    }

    pub fn with_body(mut self, text: &str) -> Self {
        self.body = Some(text.to_string());
        self
    }
}

impl PageDocument for FixturePage {
    fn select_texts(&self, selector: &str) -> Vec<String> {
        self.matches
            .iter()
            .filter(|(s, _)| s == selector)
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn body_text(&self) -> Option<String> {
        self.body.clone()
    }

    fn outer_html(&self) -> String {
        self.html.clone()
    }
}
