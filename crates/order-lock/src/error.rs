//! Order lock error types.

use thiserror::Error;

/// Error type for order placement operations.
#[derive(Error, Debug)]
pub enum OrderError {
    /// The cart is empty; there is nothing to order
    #[error("Cannot place an order with an empty cart")]
    EmptyCart,

    /// The duplex channel is not connected
    #[error("Cannot place an order while disconnected")]
    NotConnected,

    /// Invalid state transition in the order FSM
    #[error("Invalid order state transition: {0}")]
    InvalidStateTransition(String),
}

/// Result type alias using OrderError.
pub type OrderResult<T> = Result<T, OrderError>;
