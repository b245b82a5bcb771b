/// Application state for the popup and the dashboard as Yew reducers
///
/// Views render from these values only. Every transition is a pure function
/// of the previous state and an action, so the flows can be checked without
/// a browser.
use std::rc::Rc;

use yew::Reducible;

use crate::analysis::SaveOutcome;
use crate::auth::{AuthError, AuthState};
use crate::error::AppResult;
use crate::model::{AnalysisResult, Session};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// One inline message under a form or a button
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Notice {
        Notice {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Notice {
        Notice {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Notice {
        Notice {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopupView {
    /// Stored token is being checked against `/me`
    Checking,
    Login,
    Register,
    Analysis(Session),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupState {
    pub view: PopupView,
    pub notice: Option<Notice>,
    pub busy: bool,
    pub result: Option<AnalysisResult>,
    pub save_to_history: bool,
    pub save_notice: Option<Notice>,
}

impl Default for PopupState {
    fn default() -> Self {
        PopupState {
            view: PopupView::Checking,
            notice: None,
            busy: false,
            result: None,
            save_to_history: true,
            save_notice: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopupAction {
    Resumed(Result<Option<Session>, AuthError>),
    ShowLogin,
    ShowRegister,
    Submitting,
    LoggedIn(Result<Session, AuthError>),
    Registered(Result<String, AuthError>),
    LoggedOut,
    AnalysisStarted,
    AnalysisFinished(AppResult<AnalysisResult>),
    SetSaveToHistory(bool),
    SaveStarted,
    SaveFinished(AppResult<SaveOutcome>),
}

impl PopupState {
    fn logged_out(notice: Option<Notice>) -> PopupState {
        PopupState {
            view: PopupView::Login,
            notice,
            ..PopupState::default()
        }
    }

    pub fn identity(&self) -> Option<&str> {
        match &self.view {
            PopupView::Analysis(session) => Some(&session.identity),
            _ => None,
        }
    }

    fn apply(self, action: PopupAction) -> PopupState {
        match action {
            PopupAction::Resumed(Ok(Some(session))) => PopupState {
                view: PopupView::Analysis(session),
                ..PopupState::default()
            },
            PopupAction::Resumed(Ok(None)) => PopupState::logged_out(None),
            PopupAction::Resumed(Err(e)) => PopupState::logged_out(Some(Notice::error(e.to_string()))),

            PopupAction::ShowLogin => PopupState::logged_out(None),
            PopupAction::ShowRegister => PopupState {
                view: PopupView::Register,
                ..PopupState::default()
            },
            PopupAction::Submitting => PopupState {
                busy: true,
                notice: None,
                ..self
            },
            PopupAction::LoggedIn(Ok(session)) => PopupState {
                view: PopupView::Analysis(session),
                ..PopupState::default()
            },
            // Failed login keeps the form; failed verification already cleared the session
            PopupAction::LoggedIn(Err(e)) => PopupState {
                busy: false,
                notice: Some(Notice::error(e.to_string())),
                ..self
            },
            PopupAction::Registered(Ok(message)) => PopupState::logged_out(Some(Notice::success(message))),
            PopupAction::Registered(Err(e)) => PopupState {
                busy: false,
                notice: Some(Notice::error(e.to_string())),
                ..self
            },
            PopupAction::LoggedOut => PopupState::logged_out(None),

            PopupAction::AnalysisStarted => PopupState {
                busy: true,
                notice: Some(Notice::info("Getting page content...")),
                result: None,
                save_notice: None,
                ..self
            },
            PopupAction::AnalysisFinished(Ok(result)) => PopupState {
                busy: false,
                notice: None,
                result: Some(result),
                ..self
            },
            PopupAction::AnalysisFinished(Err(e)) if e.is_auth_failure() => {
                PopupState::logged_out(Some(Notice::error(e.to_string())))
            }
            PopupAction::AnalysisFinished(Err(e)) => PopupState {
                busy: false,
                notice: Some(Notice::error(e.to_string())),
                ..self
            },

            PopupAction::SetSaveToHistory(save_to_history) => PopupState {
                save_to_history,
                ..self
            },
            PopupAction::SaveStarted => PopupState {
                busy: true,
                save_notice: None,
                ..self
            },
            PopupAction::SaveFinished(Ok(outcome)) => PopupState {
                busy: false,
                save_notice: Some(match outcome {
                    SaveOutcome::Skipped => Notice::info(outcome.describe()),
                    SaveOutcome::Saved(_) => Notice::success(outcome.describe()),
                }),
                ..self
            },
            PopupAction::SaveFinished(Err(e)) if e.is_auth_failure() => {
                PopupState::logged_out(Some(Notice::error(e.to_string())))
            }
            PopupAction::SaveFinished(Err(e)) => PopupState {
                busy: false,
                save_notice: Some(Notice::error(e.to_string())),
                ..self
            },
        }
    }
}

impl Reducible for PopupState {
    type Action = PopupAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        Rc::new((*self).clone().apply(action))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Overview,
    Analyze,
    /// `/reset-password` asks for a link, `/reset-password/<token>` sets the password
    ResetPassword(Option<String>),
}

impl DashboardView {
    pub fn from_path(path: &str) -> DashboardView {
        let path = path.trim_end_matches('/');
        match path.strip_prefix("/reset-password") {
            Some("") => DashboardView::ResetPassword(None),
            Some(rest) => match rest.strip_prefix('/') {
                Some(token) if !token.is_empty() => DashboardView::ResetPassword(Some(token.to_string())),
                _ => DashboardView::Overview,
            },
            None => DashboardView::Overview,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardAppState {
    pub auth: AuthState,
    pub view: DashboardView,
    /// Bumped whenever the overview has to re-fetch
    pub refresh_key: u64,
    pub notice: Option<Notice>,
}

impl DashboardAppState {
    pub fn at_path(path: &str) -> DashboardAppState {
        DashboardAppState {
            auth: AuthState::Verifying,
            view: DashboardView::from_path(path),
            refresh_key: 0,
            notice: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.auth {
            AuthState::LoggedIn(session) => Some(session),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardAction {
    Verifying,
    Authenticated(Result<Option<Session>, AuthError>),
    LoggedOut(Option<Notice>),
    Navigate(DashboardView),
    /// A new analysis or a write landed; the overview must reload
    Refresh,
    Notify(Notice),
    DismissNotice,
}

impl DashboardAppState {
    fn apply(self, action: DashboardAction) -> DashboardAppState {
        match action {
            DashboardAction::Verifying => DashboardAppState {
                auth: AuthState::Verifying,
                ..self
            },
            DashboardAction::Authenticated(Ok(Some(session))) => DashboardAppState {
                auth: AuthState::LoggedIn(session),
                notice: None,
                refresh_key: self.refresh_key + 1,
                ..self
            },
            DashboardAction::Authenticated(Ok(None)) => DashboardAppState {
                auth: AuthState::LoggedOut,
                ..self
            },
            DashboardAction::Authenticated(Err(e)) => DashboardAppState {
                auth: AuthState::LoggedOut,
                notice: Some(Notice::error(e.to_string())),
                ..self
            },
            DashboardAction::LoggedOut(notice) => DashboardAppState {
                auth: AuthState::LoggedOut,
                view: DashboardView::Overview,
                notice,
                ..self
            },
            DashboardAction::Navigate(view) => DashboardAppState {
                view,
                notice: None,
                ..self
            },
            DashboardAction::Refresh => DashboardAppState {
                refresh_key: self.refresh_key + 1,
                ..self
            },
            DashboardAction::Notify(notice) => DashboardAppState {
                notice: Some(notice),
                ..self
            },
            DashboardAction::DismissNotice => DashboardAppState { notice: None, ..self },
        }
    }
}

impl Reducible for DashboardAppState {
    type Action = DashboardAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        Rc::new((*self).clone().apply(action))
    }
}
