//! Order lock state machine.
//!
//! Governs the transition from "editable cart" to "order submitted" to
//! "confirmed/failed", including timeout-based recovery. Exactly one order
//! is in flight per session: while it is, the entire cart is exclusively
//! locked by the initiating member.

mod error;
mod lock;
mod machine;

pub use error::{OrderError, OrderResult};
pub use lock::{OrderEvent, OrderEventCallback, OrderLock, ORDER_TIMEOUT};
pub use machine::order_machine;
pub use machine::{OrderLockState, OrderMachine, OrderMachineInput, OrderMachineState};
