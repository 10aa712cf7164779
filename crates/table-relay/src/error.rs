//! Relay error types.

use thiserror::Error;

/// Relay error type.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Authentication error
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Not connected error
    #[error("Not connected to the cart channel")]
    NotConnected,

    /// The client gave up; its machine is stuck in the terminal state
    #[error("Cart channel failed terminally; create a new client")]
    Terminal,

    /// Invalid websocket URL
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Send error
    #[error("Failed to send message: {0}")]
    Send(String),
}

/// Result type alias using RelayError.
pub type RelayResult<T> = Result<T, RelayError>;
