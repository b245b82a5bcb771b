/// Error taxonomy shared by every execution context
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// The request never produced an HTTP response (offline, DNS, CORS, ...)
    #[error("Could not reach the server: {0}")]
    Transport(String),
    /// A messaging peer was unreachable or had nothing to give back
    #[error("Could not get content from this page.")]
    NoContent,
    /// The backend rejected the token or credentials (401/403)
    #[error("{0}")]
    Unauthorized(String),
    /// Non-OK status; `message` is the server's own message when it sent one
    #[error("{message}")]
    Server { status: u16, message: String },
    /// The body was not the JSON we expected. Usually an intermediary
    /// (proxy, captive portal, blocker) answered instead of the backend.
    #[error("Server returned invalid data. The request may have been blocked before it reached the analysis service.")]
    MalformedResponse,
    #[error("{0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Messaging error: {0}")]
    Messaging(String),
}

impl AppError {
    /// True when the error means the stored session can no longer be trusted
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_displays_server_message_verbatim() {
        let err = AppError::Server {
            status: 409,
            message: "User already exists".to_string(),
        };
        assert_eq!(err.to_string(), "User already exists");
    }

    #[test]
    fn test_malformed_response_is_distinct_from_transport() {
        let malformed = AppError::MalformedResponse.to_string();
        let transport = AppError::Transport("connection refused".to_string()).to_string();

        assert!(malformed.contains("invalid data"));
        assert!(transport.starts_with("Could not reach the server"));
        assert_ne!(malformed, transport);
    }

    #[test]
    fn test_only_unauthorized_is_auth_failure() {
        assert!(AppError::Unauthorized("Token is invalid".to_string()).is_auth_failure());
        assert!(!AppError::Transport("timeout".to_string()).is_auth_failure());
        assert!(!AppError::Server { status: 500, message: "boom".to_string() }.is_auth_failure());
    }
}
