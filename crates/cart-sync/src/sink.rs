//! Outbound mutation sink.

use crate::SyncResult;
use cart_protocol::ClientMessage;

/// Transport seam for outbound messages.
///
/// The relay implements this over the duplex channel; while the channel is
/// not connected the relay logs and drops (callers own user feedback).
/// Tests substitute a recording sink.
pub trait MutationSink: Send + Sync {
    /// Deliver one message toward the server.
    fn deliver(&self, msg: ClientMessage) -> SyncResult<()>;
}
