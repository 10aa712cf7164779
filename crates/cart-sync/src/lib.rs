//! Cart synchronization engine.
//!
//! Maintains the locally-known cart, applies optimistic mutations, and
//! reconciles them against server-broadcast canonical state. The server is
//! the sole serialization point: canonical events always win, and local
//! optimistic state is a projection discarded the moment a matching event
//! arrives.

mod engine;
mod error;
mod sink;

pub use engine::{new_tmp_id, SyncEngine, SyncNotice, SyncNoticeCallback};
pub use error::{SyncError, SyncResult};
pub use sink::MutationSink;
