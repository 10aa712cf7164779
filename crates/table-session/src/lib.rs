//! Table session management for the cart client.
//!
//! This crate provides:
//! - One-shot session handshake with categorized rejection errors
//! - Persist/resume of session credentials across restarts
//! - Websocket token refresh with redundant-endpoint fallback
//! - Expiry inspection for the short-lived websocket token

mod error;
mod session;
mod token;

pub use error::{SessionError, SessionResult};
pub use session::SessionManager;
pub use token::{needs_refresh, token_expiry, REFRESH_LOOKAHEAD_SECS};
