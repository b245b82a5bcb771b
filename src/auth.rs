/// Login, registration, Google sign-in, SSO-ticket redemption and session
/// verification
///
/// Every entry point resolves to a verified [`Session`] or an [`AuthError`];
/// nothing is left half-done. A stored token is only trusted after `/me`
/// accepts it, and a rejected token is cleared on the spot.
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::api::{ApiClient, HttpTransport};
use crate::error::{AppError, AppResult};
use crate::model::{Credentials, Session};
use crate::session::{KeyValueStore, SessionStore};

pub const SSO_TICKET_PARAM: &str = "sso_ticket";
pub const REGISTERED_NOTICE: &str = "Registration successful! Please log in.";

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("This sign-in link has already been used.")]
    TicketAlreadyUsed,
    #[error("Google sign-in failed: {0}")]
    Provider(String),
    #[error(transparent)]
    Api(#[from] AppError),
}

/// `LoggedOut -> (Login | Register | GoogleOAuth | SsoRedeem) -> Verifying -> LoggedIn`
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    LoggedOut,
    Verifying,
    LoggedIn(Session),
}

/// Platform identity API (e.g. `chrome.identity`)
pub trait IdentityProvider {
    async fn access_token(&self) -> AppResult<String>;
}

/// The address bar of the current page
pub trait PageLocation {
    fn href(&self) -> String;
    /// Rewrite the visible URL without navigating
    fn replace(&self, url: &str);
}

pub fn validate_credentials(credentials: &Credentials, registering: bool) -> AppResult<()> {
    let email = credentials.email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required.".to_string()));
    }
    if credentials.password.is_empty() {
        return Err(AppError::Validation("Password is required.".to_string()));
    }
    if registering && !EMAIL_PATTERN.is_match(email) {
        return Err(AppError::Validation("Enter a valid email address.".to_string()));
    }
    Ok(())
}

/// The value of `sso_ticket` in `href`, if any
pub fn sso_ticket_from(href: &str) -> Option<String> {
    let url = url::Url::parse(href).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == SSO_TICKET_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|ticket| !ticket.is_empty())
}

/// `href` without the `param` query parameter; other parameters are kept in order
pub fn strip_query_param(href: &str, param: &str) -> String {
    let Ok(mut url) = url::Url::parse(href) else {
        return href.to_string();
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    url.to_string()
}

pub fn validate_new_password(password: &str, confirmation: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::Validation("Password is required.".to_string()));
    }
    if password != confirmation {
        return Err(AppError::Validation("Passwords do not match.".to_string()));
    }
    Ok(())
}

/// Ask for a reset link; the backend answers the same whether or not the account exists
pub async fn request_password_reset<H: HttpTransport>(api: &ApiClient<H>, username: &str) -> AppResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Enter your username.".to_string()));
    }

    let response = api.request_password_reset(username).await?;
    Ok(response
        .message
        .unwrap_or_else(|| "If an account exists, a reset link has been sent.".to_string()))
}

pub async fn reset_password<H: HttpTransport>(
    api: &ApiClient<H>,
    reset_token: &str,
    password: &str,
    confirmation: &str,
) -> AppResult<String> {
    validate_new_password(password, confirmation)?;

    let response = api.perform_password_reset(reset_token, password).await?;
    let message = response
        .message
        .unwrap_or_else(|| "Password has been reset.".to_string());
    Ok(format!("{} You can now log in.", message))
}

/// Session announced by the OAuth redirect page (`?token=..&email=..`)
pub fn oauth_callback_session(href: &str) -> Option<Session> {
    let url = url::Url::parse(href).ok()?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    };

    Some(Session::new(param("token")?, param("email")?))
}

pub struct AuthFlow<H, S> {
    api: ApiClient<H>,
    sessions: SessionStore<S>,
    /// Tickets already sent to the backend during this page load
    attempted_tickets: RefCell<HashSet<String>>,
}

impl<H: HttpTransport, S: KeyValueStore> AuthFlow<H, S> {
    pub fn new(api: ApiClient<H>, sessions: SessionStore<S>) -> AuthFlow<H, S> {
        AuthFlow {
            api,
            sessions,
            attempted_tickets: RefCell::new(HashSet::new()),
        }
    }

    pub fn api(&self) -> &ApiClient<H> {
        &self.api
    }

    pub fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    /// Popup/dashboard open: verify whatever session is stored.
    /// `Ok(None)` means there was nothing to verify.
    pub async fn resume(&self) -> Result<Option<Session>, AuthError> {
        let stored = match self.sessions.get().await {
            Ok(stored) => stored,
            Err(e) => {
                self.discard().await;
                return Err(e.into());
            }
        };

        match stored {
            Some(session) => self.verify(session).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        validate_credentials(credentials, false)?;

        let response = self.api.login(credentials).await?;
        self.establish(response.into_session(credentials.email.trim()))
            .await
    }

    /// Registration does not log in; the caller goes back to the login form
    pub async fn register(&self, credentials: &Credentials) -> Result<String, AuthError> {
        validate_credentials(credentials, true)?;

        self.api.register(credentials).await?;
        Ok(REGISTERED_NOTICE.to_string())
    }

    pub async fn sign_in_with_google<P: IdentityProvider>(&self, provider: &P) -> Result<Session, AuthError> {
        let access_token = provider
            .access_token()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let response = self.api.exchange_google_token(&access_token).await?;
        self.establish(response.into_session("")).await
    }

    /// Redeem the `sso_ticket` in the page URL, if there is one.
    ///
    /// A ticket goes to the backend at most once per page load. Whatever the
    /// outcome, the ticket is removed from the visible URL right after the
    /// attempt so a refresh cannot resubmit it.
    pub async fn redeem_sso_ticket<L: PageLocation>(&self, location: &L) -> Option<Result<Session, AuthError>> {
        let href = location.href();
        let ticket = sso_ticket_from(&href)?;

        let first_attempt = self.attempted_tickets.borrow_mut().insert(ticket.clone());
        let exchanged = if first_attempt {
            self.api
                .redeem_sso_ticket(&ticket)
                .await
                .map(|response| response.into_session(""))
                .map_err(AuthError::from)
        } else {
            log::warn!("Refusing to resubmit an SSO ticket");
            Err(AuthError::TicketAlreadyUsed)
        };

        location.replace(&strip_query_param(&href, SSO_TICKET_PARAM));

        Some(match exchanged {
            Ok(session) => self.establish(session).await,
            Err(e) => Err(e),
        })
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.sessions.clear().await.map_err(AuthError::from)
    }

    /// A rejected token ends the local session. Returns whether it did.
    pub async fn end_if_unauthorized(&self, error: &AppError) -> bool {
        if !error.is_auth_failure() {
            return false;
        }
        log::warn!("Token rejected, signing out: {}", error);
        self.discard().await;
        true
    }

    /// Irreversible. The local session goes with the account.
    pub async fn delete_account(&self, session: &Session) -> Result<String, AuthError> {
        let response = self.api.delete_account(&session.token).await?;
        self.discard().await;
        Ok(response
            .message
            .unwrap_or_else(|| "Your account has been deleted.".to_string()))
    }

    async fn establish(&self, session: Session) -> Result<Session, AuthError> {
        self.sessions.set(&session).await?;
        self.verify(session).await
    }

    async fn verify(&self, session: Session) -> Result<Session, AuthError> {
        match self.api.me(&session.token).await {
            Ok(me) => {
                let verified = Session {
                    identity: me.email,
                    ..session
                };
                if let Err(e) = self.sessions.set(&verified).await {
                    log::warn!("Could not refresh stored identity: {}", e);
                }
                Ok(verified)
            }
            Err(e) => {
                log::warn!("Session verification failed: {}", e);
                self.discard().await;
                Err(e.into())
            }
        }
    }

    async fn discard(&self) {
        if let Err(e) = self.sessions.clear().await {
            log::error!("Could not clear session: {}", e);
        }
    }
}
