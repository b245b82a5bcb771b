/// One-shot request/response messaging between popup, background and content script
///
/// Receivers register one async handler per action on a [`MessageRouter`].
/// The transport awaits the handler's future and replies with its output, so
/// a handler that does more async work before answering cannot lose its
/// response channel. Senders go through [`MessageTransport`]; an unreachable
/// peer is an error value, never a crash.
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppResult;
use crate::extractor::{PageDocument, PageContent, extract_content};
use crate::model::Session;
use crate::session::{KeyValueStore, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GetPageContent,
    LoginSuccess,
}

/// Wire shape: `{ "action": "...", ...payload }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Message {
    GetPageContent,
    /// Fire-and-forget: no reply payload
    LoginSuccess { token: String, email: String },
}

impl Message {
    pub fn action(&self) -> Action {
        match self {
            Message::GetPageContent => Action::GetPageContent,
            Message::LoginSuccess { .. } => Action::LoginSuccess,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Destination {
    /// The extension's own contexts (background, popup)
    Runtime,
    /// The content script in the active tab of the current window
    ActiveTab,
}

pub trait MessageTransport {
    /// `Ok(None)`: the peer answered without a payload.
    /// `Err(_)`: no peer, no active tab, or the channel closed.
    async fn send(&self, destination: Destination, message: &Message) -> AppResult<Option<Value>>;
}

pub type HandlerFuture = LocalBoxFuture<'static, Option<Value>>;
type Handler = Box<dyn Fn(Message) -> HandlerFuture>;

#[derive(Default)]
pub struct MessageRouter {
    handlers: HashMap<Action, Handler>,
}

impl MessageRouter {
    pub fn new() -> MessageRouter {
        MessageRouter::default()
    }

    pub fn on<F, Fut>(mut self, action: Action, handler: F) -> MessageRouter
    where
        F: Fn(Message) -> Fut + 'static,
        Fut: Future<Output = Option<Value>> + 'static,
    {
        self.handlers
            .insert(action, Box::new(move |message| handler(message).boxed_local()));
        self
    }

    pub fn handles(&self, action: Action) -> bool {
        self.handlers.contains_key(&action)
    }

    /// Run the handler for a raw incoming message. Malformed messages and
    /// actions nobody registered for get no reply.
    pub async fn dispatch(&self, raw: Value) -> Option<Value> {
        let message: Message = match serde_json::from_value(raw) {
            Ok(message) => message,
            Err(e) => {
                log::debug!("Ignoring unrecognised message: {}", e);
                return None;
            }
        };

        let Some(handler) = self.handlers.get(&message.action()) else {
            log::debug!("No handler for {:?} in this context", message.action());
            return None;
        };

        handler(message).await
    }
}

/// The context's router, filled in once startup finishes. Messages that
/// arrive earlier wait for it instead of finding no receiver.
#[derive(Default)]
pub struct RouterSlot {
    router: RefCell<Option<Rc<MessageRouter>>>,
    waiting: RefCell<Vec<oneshot::Sender<()>>>,
}

impl RouterSlot {
    pub fn new() -> RouterSlot {
        RouterSlot::default()
    }

    pub fn is_ready(&self) -> bool {
        self.router.borrow().is_some()
    }

    /// Replaces any earlier router and releases waiting messages
    pub fn install(&self, router: MessageRouter) {
        *self.router.borrow_mut() = Some(Rc::new(router));
        for waiter in self.waiting.borrow_mut().drain(..) {
            let _ = waiter.send(());
        }
    }

    pub async fn dispatch(&self, raw: Value) -> Option<Value> {
        loop {
            let router = self.router.borrow().clone();
            if let Some(router) = router {
                return router.dispatch(raw).await;
            }

            let (ready, wait) = oneshot::channel();
            self.waiting.borrow_mut().push(ready);
            log::debug!("Message arrived before the router, waiting");
            if wait.await.is_err() {
                return None;
            }
        }
    }
}

/// Ask the background for the active page's content. A transport error, a
/// missing reply or an empty page all mean "no content available".
pub async fn request_page_content<M: MessageTransport>(messenger: &M) -> Option<PageContent> {
    match messenger
        .send(Destination::Runtime, &Message::GetPageContent)
        .await
    {
        Ok(Some(reply)) => serde_json::from_value::<PageContent>(reply)
            .inspect_err(|e| log::warn!("Unreadable page content reply: {}", e))
            .ok()
            .filter(|content| !content.is_empty()),
        Ok(None) => {
            log::warn!("Page content request got no reply");
            None
        }
        Err(e) => {
            log::warn!("Page content request failed: {}", e);
            None
        }
    }
}

/// Background context: relays `get_page_content` to the active tab and
/// persists sessions announced via `login_success`
pub fn background_router<M, S>(messenger: Rc<M>, sessions: Rc<SessionStore<S>>) -> MessageRouter
where
    M: MessageTransport + 'static,
    S: KeyValueStore + 'static,
{
    MessageRouter::new()
        .on(Action::GetPageContent, move |message| {
            let messenger = Rc::clone(&messenger);
            async move {
                match messenger.send(Destination::ActiveTab, &message).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        log::warn!("Content script unreachable: {}", e);
                        None
                    }
                }
            }
        })
        .on(Action::LoginSuccess, move |message| {
            let sessions = Rc::clone(&sessions);
            async move {
                if let Message::LoginSuccess { token, email } = message {
                    if let Err(e) = sessions.set(&Session::new(token, email)).await {
                        log::error!("Could not store session: {}", e);
                    }
                }
                None
            }
        })
}

/// Content-script context: answers `get_page_content` from the live document
pub fn content_router<D: PageDocument + 'static>(document: Rc<D>, min_chars: usize) -> MessageRouter {
    MessageRouter::new().on(Action::GetPageContent, move |_| {
        let content = extract_content(document.as_ref(), min_chars);
        async move { serde_json::to_value(content).ok() }
    })
}
