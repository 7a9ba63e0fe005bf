use reqwest::StatusCode;
use thiserror::Error;

/// Shown when the token endpoint rejects credentials without a `detail`.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";
/// Shown for every other login failure.
pub const LOGIN_FAILED_MESSAGE: &str = "An error occurred while signing in";

#[derive(Debug, Error)]
pub enum GuardError {
    /// The request never completed (connection refused, DNS, TLS, body read).
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// 401 from an API endpoint other than the login call.
    #[error("unauthorized")]
    Unauthorized,

    /// 401 from the token endpoint. Carries the message shown to the user.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Any other unexpected status.
    #[error("server error: {0}")]
    ServerError(StatusCode),

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("token storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl GuardError {
    /// Text suitable for an alert during the login flow.
    pub fn user_message(&self) -> &str {
        match self {
            GuardError::InvalidCredentials(msg) => msg,
            _ => LOGIN_FAILED_MESSAGE,
        }
    }
}

impl From<reqwest_middleware::Error> for GuardError {
    fn from(err: reqwest_middleware::Error) -> Self {
        GuardError::NetworkFailure(err.to_string())
    }
}

impl From<reqwest::Error> for GuardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GuardError::Decode(err.to_string())
        } else {
            GuardError::NetworkFailure(err.to_string())
        }
    }
}
