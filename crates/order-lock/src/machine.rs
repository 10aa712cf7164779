//! Order placement state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌──────────┐  PlaceOrder   ┌──────────────┐
//! │   Idle   │ ────────────► │  Processing  │
//! └──────────┘               └──────┬───────┘
//!      ▲                            │
//!      │          ServerConfirmed   │   ServerFailed / TimedOut
//!      │                ▼           ▼
//!      │         ┌───────────┐  ┌──────────┐
//!      │         │ Confirmed │  │  Failed  │
//!      │         └─────┬─────┘  └────┬─────┘
//!      │   Acknowledge │             │ Acknowledge
//!      └───────────────┴─────────────┘
//! ```
//!
//! A purely server-driven lock with no client-side timeout risks a
//! permanently stuck UI if a confirmation message is lost; the timeout
//! trades a small risk of false "failed" reporting against never
//! deadlocking the cart.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub order_machine(Idle)

    Idle => {
        PlaceOrder => Processing
    },
    Processing => {
        ServerConfirmed => Confirmed,
        ServerFailed => Failed,
        TimedOut => Failed
    },
    Confirmed => {
        Acknowledge => Idle
    },
    Failed => {
        Acknowledge => Idle
    }
}

// Re-export the generated types with clearer names
pub use order_machine::Input as OrderMachineInput;
pub use order_machine::State as OrderMachineState;
pub use order_machine::StateMachine as OrderMachine;

/// Simplified lock state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderLockState {
    /// Cart is editable; no order in flight.
    Idle,
    /// An order was submitted and the cart is locked awaiting the outcome.
    Processing,
    /// The order was confirmed (momentary; released to Idle immediately).
    Confirmed,
    /// The order failed or timed out (momentary; released to Idle).
    Failed,
}

impl OrderLockState {
    /// Returns true while the cart must reject mutations.
    pub fn is_locked(&self) -> bool {
        matches!(self, OrderLockState::Processing)
    }
}

impl From<&OrderMachineState> for OrderLockState {
    fn from(state: &OrderMachineState) -> Self {
        match state {
            OrderMachineState::Idle => OrderLockState::Idle,
            OrderMachineState::Processing => OrderLockState::Processing,
            OrderMachineState::Confirmed => OrderLockState::Confirmed,
            OrderMachineState::Failed => OrderLockState::Failed,
        }
    }
}
