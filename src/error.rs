//! Error taxonomy for the authentication flow.
//!
//! Lower layers (credential store, callback receiver, token exchanger) return
//! these errors untouched. Only [`crate::management::TokenManager`] decides
//! whether a failure triggers the refresh fallback or ends the call, and it
//! wraps terminal failures in [`AuthError::Authentication`].

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing or invalid user input (credentials, endpoints, addresses).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No redirect reached the local callback receiver in time.
    #[error("no authorization callback received within {} seconds", .0.as_secs())]
    CallbackTimeout(Duration),

    /// The provider redirected back with `error=...` instead of a code.
    #[error("authorization was rejected by the provider: {0}")]
    CallbackRejected(String),

    /// The token endpoint answered with a non-success status or an unusable body.
    #[error("token exchange failed with status {status}: {body}")]
    TokenExchange { status: u16, body: String },

    /// Terminal failure of `get_access_token` after the fallback was exhausted.
    #[error("authentication failed: {0}")]
    Authentication(#[source] Box<AuthError>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuthError {
    /// Returns the innermost error, looking through `Authentication` wrappers.
    pub fn cause(&self) -> &AuthError {
        match self {
            AuthError::Authentication(inner) => inner.cause(),
            other => other,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self.cause(), AuthError::Configuration(_))
    }
}
