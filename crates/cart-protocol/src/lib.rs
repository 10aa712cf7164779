//! Shared data model and wire protocol for the collaborative cart.
//!
//! This crate provides:
//! - The cart data model (items, members, orders, credentials)
//! - Inbound server events as an exhaustively matched tagged enum
//! - Outbound client messages (heartbeat, mutation envelopes, place order)

mod events;
mod messages;
mod model;

pub use events::{ServerEvent, ERROR_CODE_VERSION_CONFLICT};
pub use messages::{AddonSelection, CartOp, ClientMessage, MutationEnvelope};
pub use model::{
    CartItem, CartSnapshot, Member, Order, OrderStatus, SelectedAddon, SelectedVariation,
    SessionCredentials,
};
