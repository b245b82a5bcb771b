/// Analysis requests: input validation, the popup's page-analysis flow, and
/// the opt-in save step
use serde_json::{Value, json};

use crate::api::{ApiClient, HttpTransport};
use crate::error::{AppError, AppResult};
use crate::extractor::PageContent;
use crate::messaging::{MessageTransport, request_page_content};
use crate::model::{AnalysisResult, SaveResponse};
use crate::session::{KeyValueStore, SessionStore};

/// Scores inside (-0.05, 0.05) count as neutral
pub const NEUTRAL_BAND: f64 = 0.05;

/// What `/analyze` gets. The popup sends page content, the dashboard a URL;
/// each variant serializes to exactly one body shape.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisInput {
    Url(String),
    Page(PageContent),
}

impl AnalysisInput {
    pub fn validate(&self) -> AppResult<()> {
        match self {
            AnalysisInput::Url(url) if url.trim().is_empty() => {
                Err(AppError::Validation("Enter a URL".to_string()))
            }
            AnalysisInput::Url(url) => url::Url::parse(url.trim())
                .map(|_| ())
                .map_err(|_| AppError::Validation(format!("'{}' is not a valid URL", url.trim()))),
            AnalysisInput::Page(content) if content.is_empty() => Err(AppError::NoContent),
            AnalysisInput::Page(_) => Ok(()),
        }
    }

    pub fn to_body(&self) -> Value {
        match self {
            AnalysisInput::Url(url) => json!({ "url": url.trim() }),
            AnalysisInput::Page(content) => json!({
                "html_content": content.html,
                "visible_text": content.visible_text,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tone {
    Positive,
    Neutral,
    Negative,
}

impl Tone {
    pub fn of(score: f64) -> Tone {
        if score > NEUTRAL_BAND {
            Tone::Positive
        } else if score < -NEUTRAL_BAND {
            Tone::Negative
        } else {
            Tone::Neutral
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Tone::Positive => "sentiment-positive",
            Tone::Neutral => "sentiment-neutral",
            Tone::Negative => "sentiment-negative",
        }
    }
}

pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// "Save to history" was unchecked; nothing was sent
    Skipped,
    Saved(SaveResponse),
}

impl SaveOutcome {
    pub fn describe(&self) -> String {
        match self {
            SaveOutcome::Skipped => "Not saved: \"Save to history\" is unchecked.".to_string(),
            SaveOutcome::Saved(response) if response.message.is_empty() => {
                format!("Saved ({} articles in history).", response.count)
            }
            SaveOutcome::Saved(response) => {
                format!("{} ({} articles in history).", response.message, response.count)
            }
        }
    }
}

/// Popup flow, strictly in order: page content, then token, then `/analyze`
pub async fn analyze_current_page<M, S, H>(
    messenger: &M,
    sessions: &SessionStore<S>,
    api: &ApiClient<H>,
) -> AppResult<AnalysisResult>
where
    M: MessageTransport,
    S: KeyValueStore,
    H: HttpTransport,
{
    let content = request_page_content(messenger)
        .await
        .ok_or(AppError::NoContent)?;

    let session = sessions
        .get()
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not logged in.".to_string()))?;

    api.analyze(&AnalysisInput::Page(content), &session.token)
        .await
}

/// Persist a result only when the user asked for it
pub async fn save_result<H: HttpTransport>(
    api: &ApiClient<H>,
    result: &AnalysisResult,
    token: &str,
    save_to_history: bool,
) -> AppResult<SaveOutcome> {
    if !save_to_history {
        log::debug!("Save skipped by user");
        return Ok(SaveOutcome::Skipped);
    }

    api.save_analysis(result, token).await.map(SaveOutcome::Saved)
}
