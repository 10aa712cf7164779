//! Outbound client messages.

use serde::{Deserialize, Serialize};

/// A mutation's operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOp {
    Create,
    Update,
    Replace,
    Delete,
}

/// An add-on chosen by id and quantity, before pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonSelection {
    /// Add-on ID within the menu catalog
    pub addon_id: String,
    /// Quantity
    pub qty: u32,
}

/// An intended cart edit, in flight between client and server.
///
/// `create` carries a client-chosen `tmpId`; `update`/`replace`/`delete`
/// carry the `public_id` plus the last-known per-item `version` so the
/// server can detect stale concurrent edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEnvelope {
    /// Operation kind
    pub op: CartOp,
    /// Client-chosen temporary id (`create` only)
    #[serde(rename = "tmpId", skip_serializing_if = "Option::is_none")]
    pub tmp_id: Option<String>,
    /// Target item public ID (`update`/`replace`/`delete`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    /// Referenced menu item (`create`/`replace`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_item_id: Option<String>,
    /// New quantity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<u32>,
    /// New note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Last-known item version (`update`/`replace`/`delete`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Selected variation id (`create`/`replace`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_item_variation_id: Option<String>,
    /// Selected add-ons by id and quantity (`create`/`replace`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_addons: Vec<AddonSelection>,
}

impl MutationEnvelope {
    /// Create a `create` envelope keyed by a temporary id.
    pub fn create(
        tmp_id: &str,
        menu_item_id: &str,
        qty: u32,
        note: &str,
        variation_id: Option<&str>,
        addons: Vec<AddonSelection>,
    ) -> Self {
        Self {
            op: CartOp::Create,
            tmp_id: Some(tmp_id.to_string()),
            public_id: None,
            menu_item_id: Some(menu_item_id.to_string()),
            qty: Some(qty),
            note: Some(note.to_string()),
            version: None,
            selected_item_variation_id: variation_id.map(|s| s.to_string()),
            selected_addons: addons,
        }
    }

    /// Create an `update` envelope carrying the last-known version.
    pub fn update(public_id: &str, qty: u32, note: &str, version: u64) -> Self {
        Self {
            op: CartOp::Update,
            tmp_id: None,
            public_id: Some(public_id.to_string()),
            menu_item_id: None,
            qty: Some(qty),
            note: Some(note.to_string()),
            version: Some(version),
            selected_item_variation_id: None,
            selected_addons: Vec::new(),
        }
    }

    /// Create a `replace` envelope substituting the item and customization.
    #[allow(clippy::too_many_arguments)]
    pub fn replace(
        public_id: &str,
        menu_item_id: &str,
        qty: u32,
        note: &str,
        version: u64,
        variation_id: Option<&str>,
        addons: Vec<AddonSelection>,
    ) -> Self {
        Self {
            op: CartOp::Replace,
            tmp_id: None,
            public_id: Some(public_id.to_string()),
            menu_item_id: Some(menu_item_id.to_string()),
            qty: Some(qty),
            note: Some(note.to_string()),
            version: Some(version),
            selected_item_variation_id: variation_id.map(|s| s.to_string()),
            selected_addons: addons,
        }
    }

    /// Create a `delete` envelope.
    pub fn delete(public_id: &str, version: u64) -> Self {
        Self {
            op: CartOp::Delete,
            tmp_id: None,
            public_id: Some(public_id.to_string()),
            menu_item_id: None,
            qty: None,
            note: None,
            version: Some(version),
            selected_item_variation_id: None,
            selected_addons: Vec::new(),
        }
    }
}

/// A message sent from client to server over the duplex channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat probe; the server answers with `pong`.
    Ping,
    /// A cart mutation envelope.
    CartMutation {
        #[serde(flatten)]
        mutation: MutationEnvelope,
    },
    /// Atomically fold the whole cart into an order.
    PlaceOrder {
        special_instructions: String,
        /// Client-computed total, minor units; the server re-verifies.
        total: i64,
    },
}

impl ClientMessage {
    /// Wrap a mutation envelope.
    pub fn mutation(mutation: MutationEnvelope) -> Self {
        Self::CartMutation { mutation }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
