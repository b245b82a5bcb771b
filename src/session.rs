/// Session persistence over a key-value storage area
///
/// The extension keeps its session in `chrome.storage.sync`, the dashboard in
/// the tab's `sessionStorage`. Both are reached through [`KeyValueStore`], so the
/// session logic is the same in either place and testable off-browser.
use crate::error::AppResult;
use crate::model::Session;

/// Minimal async string store. Writes are last-write-wins.
pub trait KeyValueStore {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> AppResult<()>;
    async fn remove_items(&self, keys: &[&str]) -> AppResult<()>;
}

/// Storage keys for each session field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionKeys {
    pub token: &'static str,
    pub identity: &'static str,
    pub refresh_token: &'static str,
}

/// Layout used by the extension (`chrome.storage.sync`)
pub const EXTENSION_KEYS: SessionKeys = SessionKeys {
    token: "token",
    identity: "email",
    refresh_token: "refreshToken",
};

/// Layout used by the dashboard (`sessionStorage`)
pub const DASHBOARD_KEYS: SessionKeys = SessionKeys {
    token: "token",
    identity: "username",
    refresh_token: "refreshToken",
};

#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    storage: S,
    keys: SessionKeys,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: S, keys: SessionKeys) -> Self {
        SessionStore { storage, keys }
    }

    /// The stored session, or `None` when there is no usable token
    pub async fn get(&self) -> AppResult<Option<Session>> {
        let token = match self.storage.get_item(self.keys.token).await? {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(None),
        };

        let identity = self
            .storage
            .get_item(self.keys.identity)
            .await?
            .unwrap_or_default();
        let refresh_token = self
            .storage
            .get_item(self.keys.refresh_token)
            .await?
            .filter(|t| !t.is_empty());

        Ok(Some(Session::new(token, identity).with_refresh_token(refresh_token)))
    }

    pub async fn set(&self, session: &Session) -> AppResult<()> {
        self.storage.set_item(self.keys.token, &session.token).await?;
        self.storage
            .set_item(self.keys.identity, &session.identity)
            .await?;

        match &session.refresh_token {
            Some(refresh) => self.storage.set_item(self.keys.refresh_token, refresh).await,
            None => self.storage.remove_items(&[self.keys.refresh_token]).await,
        }
    }

    pub async fn clear(&self) -> AppResult<()> {
        self.storage
            .remove_items(&[self.keys.token, self.keys.identity, self.keys.refresh_token])
            .await
    }
}
