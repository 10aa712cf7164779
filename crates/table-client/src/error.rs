//! Client error types.

use thiserror::Error;

/// Top-level client error.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Session error
    #[error(transparent)]
    Session(#[from] table_session::SessionError),

    /// Relay error
    #[error(transparent)]
    Relay(#[from] table_relay::RelayError),

    /// Sync engine error
    #[error(transparent)]
    Sync(#[from] cart_sync::SyncError),

    /// Order lock error
    #[error(transparent)]
    Order(#[from] order_lock::OrderError),

    /// Storage error
    #[error(transparent)]
    Storage(#[from] cart_storage::StorageError),

    /// Device identity error
    #[error(transparent)]
    Identity(#[from] device_identity::IdentityError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] cart_config::CoreError),

    /// Cart snapshot fetch error
    #[error("Snapshot fetch failed: {0}")]
    Snapshot(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No active table session
    #[error("Not joined to a table")]
    NotJoined,
}

/// Result type alias using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
