//! Client runtime for collaborative table ordering.
//!
//! This crate wires the other pieces together:
//! - Session handshake / resume, with token refresh before connect
//! - Snapshot-seeded cart state
//! - Inbound server event dispatch to the sync engine and order lock
//! - A facade for cart mutations and order placement

mod client;
mod error;
mod snapshot;

pub use client::TableClient;
pub use error::{ClientError, ClientResult};
pub use snapshot::SnapshotClient;
