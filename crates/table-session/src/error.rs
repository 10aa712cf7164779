//! Session error types.

use thiserror::Error;

/// Session error type.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The table does not exist
    #[error("Table not found")]
    TableNotFound,

    /// The join token was rejected
    #[error("Invalid or expired table token")]
    BadToken,

    /// The restaurant is not accepting sessions right now
    #[error("Restaurant is closed")]
    RestaurantClosed,

    /// The table exists but ordering is disabled for it
    #[error("Ordering is disabled for this table")]
    TableDisabled,

    /// Handshake rejected for an uncategorized reason
    #[error("Session handshake failed: {0}")]
    Handshake(String),

    /// No persisted session to resume or refresh
    #[error("Not joined to a table")]
    NotJoined,

    /// Token refresh error
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] cart_storage::StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Map a server error key from the handshake response to an error.
    pub fn from_error_key(key: &str, detail: Option<String>) -> Self {
        match key {
            "table_not_found" => SessionError::TableNotFound,
            "bad_token" => SessionError::BadToken,
            "restaurant_closed" => SessionError::RestaurantClosed,
            "table_disabled" => SessionError::TableDisabled,
            other => SessionError::Handshake(detail.unwrap_or_else(|| other.to_string())),
        }
    }

    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Transient errors are connection failures, timeouts, and 5xx responses.
    /// Categorized handshake rejections are never transient; the user has to
    /// change something first.
    pub fn is_transient(&self) -> bool {
        match self {
            SessionError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_key_mapping() {
        assert!(matches!(
            SessionError::from_error_key("table_not_found", None),
            SessionError::TableNotFound
        ));
        assert!(matches!(
            SessionError::from_error_key("bad_token", None),
            SessionError::BadToken
        ));
        assert!(matches!(
            SessionError::from_error_key("restaurant_closed", None),
            SessionError::RestaurantClosed
        ));
        assert!(matches!(
            SessionError::from_error_key("table_disabled", None),
            SessionError::TableDisabled
        ));
    }

    #[test]
    fn test_unknown_error_key_keeps_detail() {
        match SessionError::from_error_key("rate_limited", Some("slow down".to_string())) {
            SessionError::Handshake(msg) => assert_eq!(msg, "slow down"),
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_error_key_without_detail() {
        match SessionError::from_error_key("rate_limited", None) {
            SessionError::Handshake(msg) => assert_eq!(msg, "rate_limited"),
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_categorized_errors_not_transient() {
        assert!(!SessionError::TableNotFound.is_transient());
        assert!(!SessionError::BadToken.is_transient());
        assert!(!SessionError::RestaurantClosed.is_transient());
        assert!(!SessionError::TableDisabled.is_transient());
        assert!(!SessionError::NotJoined.is_transient());
    }
}
