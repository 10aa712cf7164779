//! Inbound server events.

use crate::{CartItem, CartOp, Member, Order};
use serde::{Deserialize, Serialize};

/// Error code the server uses when a mutation referenced a stale version.
pub const ERROR_CODE_VERSION_CONFLICT: &str = "version_conflict";

/// An event broadcast by the server over the duplex channel.
///
/// Canonical state only ever changes through these events; local optimistic
/// state is a projection discarded the moment a matching event arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A member joined the session.
    MemberJoin { member: Member },

    /// A canonical cart change. `item` is absent for deletes; `tmp_id`
    /// echoes the client-chosen id on creates so the shadow item can be
    /// matched up.
    CartUpdate {
        op: CartOp,
        #[serde(default)]
        item: Option<CartItem>,
        #[serde(default)]
        public_id: Option<String>,
        #[serde(rename = "tmpId", default)]
        tmp_id: Option<String>,
        cart_version: u64,
    },

    /// The whole cart is now exclusively locked by an order in flight.
    CartLocked {
        order_id: String,
        locked_by_member: String,
    },

    /// The in-flight order was confirmed; the cart is folded into it.
    OrderConfirmed { order: Order },

    /// The in-flight order failed; the cart is left intact.
    OrderFailed { error: String },

    /// Administrative close; clients must reset to a pre-session view.
    TableClosed { message: String },

    /// Heartbeat answer.
    Pong,

    /// Application-level error (including version conflicts).
    Error {
        code: String,
        #[serde(default)]
        detail: Option<String>,
    },
}

impl ServerEvent {
    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// True for an `error` event carrying a version conflict.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, ServerEvent::Error { code, .. } if code == ERROR_CODE_VERSION_CONFLICT)
    }
}
