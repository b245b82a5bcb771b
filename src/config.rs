/// Runtime configuration: backend and dashboard locations, extraction threshold
use serde::Deserialize;

use crate::session::KeyValueStore;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:3000";
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 100;

/// Storage key holding a partial JSON override in extension-local storage
pub const CONFIG_KEY: &str = "config";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub dashboard_url: String,
    pub min_content_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: option_env!("ECHO_ESCAPE_API_URL")
                .unwrap_or(DEFAULT_API_URL)
                .to_string(),
            dashboard_url: option_env!("ECHO_ESCAPE_DASHBOARD_URL")
                .unwrap_or(DEFAULT_DASHBOARD_URL)
                .to_string(),
            min_content_chars: DEFAULT_MIN_CONTENT_CHARS,
        }
        .normalized()
    }
}

impl Config {
    /// Parse a (possibly partial) JSON override. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Config, serde_json::Error> {
        serde_json::from_str::<Config>(json).map(Config::normalized)
    }

    /// Defaults merged with whatever override sits in `store`.
    /// A broken override is logged and ignored rather than blocking startup.
    pub async fn load<S: KeyValueStore>(store: &S) -> Config {
        match store.get_item(CONFIG_KEY).await {
            Ok(Some(json)) => Config::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config override: {}", e);
                Config::default()
            }),
            Ok(None) => Config::default(),
            Err(e) => {
                log::warn!("Could not read config override: {}", e);
                Config::default()
            }
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Dashboard URL carrying a one-time SSO ticket
    pub fn dashboard_handoff_url(&self, ticket: &str) -> String {
        let ticket: String = url::form_urlencoded::byte_serialize(ticket.as_bytes()).collect();
        format!("{}?sso_ticket={}", self.dashboard_url, ticket)
    }

    pub fn password_reset_url(&self) -> String {
        format!("{}/reset-password", self.dashboard_url)
    }

    /// Server-side Google redirect flow; `state` tells the backend where to send the user back
    pub fn google_login_url(&self, state: &str) -> String {
        format!("{}?state={}", self.endpoint("login/google"), state)
    }

    fn normalized(mut self) -> Config {
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        self.dashboard_url = self.dashboard_url.trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.min_content_chars, 100);
        assert!(!config.api_url.ends_with('/'));
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = Config::from_json(r#"{"api_url": "https://api.example.org/"}"#).unwrap();

        assert_eq!(config.api_url, "https://api.example.org");
        assert_eq!(config.dashboard_url, Config::default().dashboard_url);
        assert_eq!(config.min_content_chars, DEFAULT_MIN_CONTENT_CHARS);
    }

    #[test]
    fn test_urls() {
        let config = Config::from_json(
            r#"{"api_url": "https://api.example.org", "dashboard_url": "https://dash.example.org/"}"#,
        )
        .unwrap();

        assert_eq!(config.endpoint("/analyze"), "https://api.example.org/analyze");
        assert_eq!(config.endpoint("me"), "https://api.example.org/me");
        assert_eq!(
            config.dashboard_handoff_url("abc123"),
            "https://dash.example.org?sso_ticket=abc123"
        );
        assert_eq!(config.password_reset_url(), "https://dash.example.org/reset-password");
        assert_eq!(
            config.google_login_url("extension"),
            "https://api.example.org/login/google?state=extension"
        );
    }

    #[tokio::test]
    async fn test_load_from_store() {
        let store = MemoryStore::new();
        store.insert(CONFIG_KEY, r#"{"min_content_chars": 250}"#);

        let config = Config::load(&store).await;

        assert_eq!(config.min_content_chars, 250);
    }

    #[tokio::test]
    async fn test_load_ignores_garbage() {
        let store = MemoryStore::new();
        store.insert(CONFIG_KEY, "not json at all");

        let config = Config::load(&store).await;

        assert_eq!(config, Config::default());
    }
}
