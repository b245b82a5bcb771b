/// Data structures exchanged with the analysis backend
use serde::{Deserialize, Serialize};

/// Authenticated identity held by the popup or the dashboard.
/// Treat it as unverified until `/me` has accepted the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    /// Email or username, whichever the backend identifies the user by
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>, identity: impl Into<String>) -> Session {
        Session {
            token: token.into(),
            identity: identity.into(),
            refresh_token: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Session {
        self.refresh_token = refresh_token;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `/login`, `/redeem_sso_ticket` and `/auth/google/token` on success
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default, alias = "username")]
    pub email: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl LoginResponse {
    /// Build a session, falling back to `fallback_identity` when the server omits one
    pub fn into_session(self, fallback_identity: &str) -> Session {
        let identity = self
            .email
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback_identity.to_string());
        Session::new(self.token, identity).with_refresh_token(self.refresh_token)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    #[serde(alias = "username")]
    pub email: String,
}

/// Generic `{ message }` body used by most mutating endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub sentiment: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// `/analyze` wraps the result in `data`, or explains itself in `message`
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub data: Option<AnalysisResult>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub count: u64,
}

/// One saved analysis in the reading history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardEntry {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub sentiment: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryStat {
    pub category: String,
    pub article_count: u64,
    pub average_sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceStat {
    #[serde(alias = "publisher")]
    pub source: String,
    #[serde(default)]
    pub article_count: u64,
    #[serde(default)]
    pub average_sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimelinePoint {
    /// `YYYY-MM-DD`
    pub date: String,
    pub average_sentiment: f64,
    #[serde(default)]
    pub article_count: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Topics {
    #[serde(default)]
    pub default_topics: Vec<String>,
    #[serde(default)]
    pub custom_topics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SsoTicketResponse {
    #[serde(default)]
    pub sso_ticket: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = Session::new("tok", "reader@example.org")
            .with_refresh_token(Some("refresh".to_string()));

        assert_eq!(session.token, "tok");
        assert_eq!(session.identity, "reader@example.org");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn test_login_response_accepts_username() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"token": "t1", "username": "reader"}"#).unwrap();

        let session = response.into_session("typed@example.org");

        assert_eq!(session.identity, "reader");
        assert_eq!(session.refresh_token, None);
    }

    #[test]
    fn test_login_response_falls_back_to_typed_identity() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"token": "t1", "refresh_token": "r1"}"#).unwrap();

        let session = response.into_session("typed@example.org");

        assert_eq!(session.identity, "typed@example.org");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    }

    #[test]
    fn test_analysis_result_optional_fields() {
        let result: AnalysisResult = serde_json::from_str(
            r#"{"title": "Rates rise", "sentiment": -0.4, "keywords": ["rates", "bank"]}"#,
        )
        .unwrap();

        assert_eq!(result.title, "Rates rise");
        assert_eq!(result.author, None);
        assert_eq!(result.keywords, vec!["rates", "bank"]);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("author").is_none());
        assert!(json.get("category").is_none());
    }

    #[test]
    fn test_dashboard_entry_defaults() {
        let entry: DashboardEntry =
            serde_json::from_str(r#"{"id": 7, "title": "T", "sentiment": 0.2}"#).unwrap();

        assert_eq!(entry.id, 7);
        assert!(entry.keywords.is_empty());
        assert_eq!(entry.category, "");
    }
}
