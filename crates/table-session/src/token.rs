//! Websocket token expiry inspection.
//!
//! The server issues short-lived JWTs for the cart channel. The client only
//! reads the `exp` claim to decide when to refresh; signature validation is
//! the server's job, never done here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// How far ahead of expiry a token counts as needing refresh.
pub const REFRESH_LOOKAHEAD_SECS: i64 = 15 * 60;

#[derive(Debug, Deserialize)]
struct TokenClaims {
    exp: i64,
}

/// Decode the `exp` claim from a JWT, if the token is readable.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}

/// True when the token expires within the lookahead window.
///
/// Unreadable tokens count as needing refresh; better a spurious refresh
/// than connecting with a token we cannot reason about.
pub fn needs_refresh(token: &str) -> bool {
    match token_expiry(token) {
        Some(expiry) => (expiry - Utc::now()).num_seconds() <= REFRESH_LOOKAHEAD_SECS,
        None => true,
    }
}
