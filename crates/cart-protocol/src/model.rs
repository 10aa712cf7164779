//! Cart data model.

use serde::{Deserialize, Serialize};

/// Credentials returned by the session handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCredentials {
    /// Session public ID
    pub session_pid: String,
    /// This device's member public ID
    pub member_pid: String,
    /// Whether this member may act on any member's items
    pub is_host: bool,
    /// Short-lived websocket token (JWT, carries an expiry claim)
    pub ws_token: String,
    /// Table number
    pub table_number: u32,
    /// Restaurant name
    pub restaurant_name: String,
}

/// One device's participation identity within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Member public ID
    pub member_pid: String,
    /// Display nickname
    pub nickname: String,
    /// Host may act on any member's items
    pub is_host: bool,
}

/// A selected menu item variation (e.g. size) with its price delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedVariation {
    /// Variation group name (e.g. "Size")
    pub group: String,
    /// Variation name (e.g. "Large")
    pub variation: String,
    /// Price delta in minor currency units
    pub price: i64,
}

/// A selected add-on with quantity and unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedAddon {
    /// Add-on ID within the menu catalog
    pub addon_id: String,
    /// Quantity of this add-on
    pub qty: u32,
    /// Unit price in minor currency units
    pub price: i64,
}

/// One line of the shared cart.
///
/// Before server confirmation a line exists as a shadow item: `public_id`
/// holds the client-chosen temporary id and `is_pending` is set. The
/// canonical `create` broadcast swaps in the server-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Stable public ID (temporary client id while pending)
    pub public_id: String,
    /// Owning member's public ID
    pub member_pid: String,
    /// Referenced menu item's public ID
    pub menu_item_pid: String,
    /// Quantity, >= 0
    pub qty: u32,
    /// Free-form note to the kitchen
    #[serde(default)]
    pub note: String,
    /// Selected variation, if any
    #[serde(default)]
    pub selected_variation: Option<SelectedVariation>,
    /// Selected add-ons
    #[serde(default)]
    pub selected_addons: Vec<SelectedAddon>,
    /// Unit price derived by the pricing resolver, minor units
    pub final_price: i64,
    /// Per-item monotonic version, advanced only by canonical broadcasts
    pub version: u64,
    /// Local-only marker for a not-yet-confirmed shadow item
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_pending: bool,
}

/// Terminal status of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Confirmed,
    Failed,
}

/// An immutable order record, created server-side at confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: String,
    /// Frozen snapshot of the cart items at confirmation time
    pub items: Vec<CartItem>,
    /// Order total in minor currency units
    pub total: i64,
    /// Member public ID that initiated the order
    pub initiated_by: String,
    /// Terminal status
    pub status: OrderStatus,
    /// Confirmation timestamp (ISO)
    pub timestamp: String,
}

/// Full cart state fetched over REST, used to seed local state on resume
/// instead of replaying history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Current cart items
    pub items: Vec<CartItem>,
    /// Whole-cart monotonic version
    pub cart_version: u64,
    /// Whether an order is currently in flight
    #[serde(default)]
    pub locked: bool,
    /// Session members
    #[serde(default)]
    pub members: Vec<Member>,
    /// Order history, newest first
    #[serde(default)]
    pub order_history: Vec<Order>,
}
