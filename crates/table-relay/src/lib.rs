//! WebSocket connection resilience layer for the cart channel.
//!
//! This crate provides:
//! - WebSocket connection to the table's cart channel
//! - Automatic reconnection with capped exponential backoff
//! - Token refresh on auth-failure closes (one uncounted retry)
//! - Heartbeat for connection keepalive
//! - `MutationSink` delivery for the sync engine

mod client;
mod error;
mod machine;

pub use client::{
    FatalReason, RelayClient, RelayConfig, RelayEvent, TokenRefresher, CLOSE_CODE_AUTH_FAILURE,
    CLOSE_CODE_CONNECTION_LIMIT,
};
pub use error::{RelayError, RelayResult};
pub use machine::{ConnectionMachine, ConnectionState};
