//! Sync engine error types.

use thiserror::Error;

/// Error type for cart sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The cart is exclusively locked by an order in flight
    #[error("Cart is locked while an order is being processed")]
    CartLocked,

    /// The referenced item does not exist locally
    #[error("Unknown cart item: {0}")]
    UnknownItem(String),

    /// A zero-or-negative quantity was requested on create
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// The outbound sink rejected a message
    #[error("Sink error: {0}")]
    Sink(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using SyncError.
pub type SyncResult<T> = Result<T, SyncError>;
