//! Connection lifecycle state machine using rust-fsm.
//!
//! ```text
//! ┌──────────────┐   Connect   ┌────────────┐   Opened   ┌───────────┐
//! │ Disconnected │ ──────────► │ Connecting │ ─────────► │ Connected │
//! └──────┬───────┘ ◄────────── └─────┬──────┘            └─────┬─────┘
//!        │            Retry          │                         │
//!        │                           │ Fatal       Fatal       │ Closed
//!        │ Fatal                     ▼                         │
//!        │                     ┌───────────┐                   │
//!        └───────────────────► │   Error   │ ◄─────────────────┘
//!                              └───────────┘        (via Disconnected)
//! ```
//!
//! `Error` is terminal: either the reconnect budget is exhausted or the
//! server closed with a code that reconnection cannot fix. Leaving it
//! requires a fresh client.

use rust_fsm::*;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub connection_machine(Disconnected)

    Disconnected => {
        Connect => Connecting,
        Fatal => Error
    },
    Connecting => {
        Opened => Connected,
        Retry => Disconnected,
        Fatal => Error
    },
    Connected => {
        Closed => Disconnected,
        Fatal => Error
    }
}

// Re-export the generated types with clearer names
pub use connection_machine::Input as ConnectionInput;
pub use connection_machine::State as ConnectionMachineState;
pub use connection_machine::StateMachine as ConnectionMachine;

/// Simplified connection state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket; either never connected or waiting out a backoff delay.
    Disconnected,
    /// A dial is in flight.
    Connecting,
    /// Socket open; outbound messages flow.
    Connected,
    /// Terminal failure; manual restart required.
    Error,
}

impl ConnectionState {
    /// Returns true once the client has given up reconnecting.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Error)
    }
}

impl From<&ConnectionMachineState> for ConnectionState {
    fn from(state: &ConnectionMachineState) -> Self {
        match state {
            ConnectionMachineState::Disconnected => ConnectionState::Disconnected,
            ConnectionMachineState::Connecting => ConnectionState::Connecting,
            ConnectionMachineState::Connected => ConnectionState::Connected,
            ConnectionMachineState::Error => ConnectionState::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_disconnected() {
        let machine = ConnectionMachine::new();
        assert_eq!(*machine.state(), ConnectionMachineState::Disconnected);
    }

    #[test]
    fn test_happy_path() {
        let mut machine = ConnectionMachine::new();

        machine.consume(&ConnectionInput::Connect).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Connecting);

        machine.consume(&ConnectionInput::Opened).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Connected);

        machine.consume(&ConnectionInput::Closed).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Disconnected);
    }

    #[test]
    fn test_dial_failure_returns_to_disconnected() {
        let mut machine = ConnectionMachine::new();

        machine.consume(&ConnectionInput::Connect).unwrap();
        machine.consume(&ConnectionInput::Retry).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Disconnected);

        // And a later dial can proceed
        machine.consume(&ConnectionInput::Connect).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Connecting);
    }

    #[test]
    fn test_fatal_from_every_live_state() {
        for setup in [
            Vec::new(),
            vec![ConnectionInput::Connect],
            vec![ConnectionInput::Connect, ConnectionInput::Opened],
        ] {
            let mut machine = ConnectionMachine::new();
            for input in &setup {
                machine.consume(input).unwrap();
            }
            machine.consume(&ConnectionInput::Fatal).unwrap();
            assert_eq!(*machine.state(), ConnectionMachineState::Error);
        }
    }

    #[test]
    fn test_error_is_terminal() {
        let mut machine = ConnectionMachine::new();
        machine.consume(&ConnectionInput::Fatal).unwrap();

        assert!(machine.consume(&ConnectionInput::Connect).is_err());
        assert!(machine.consume(&ConnectionInput::Opened).is_err());
        assert!(machine.consume(&ConnectionInput::Closed).is_err());
        assert!(machine.consume(&ConnectionInput::Retry).is_err());
    }

    #[test]
    fn test_cannot_open_without_dialing() {
        let mut machine = ConnectionMachine::new();
        assert!(machine.consume(&ConnectionInput::Opened).is_err());
        assert!(machine.consume(&ConnectionInput::Closed).is_err());
    }

    #[test]
    fn test_state_conversion() {
        assert_eq!(
            ConnectionState::from(&ConnectionMachineState::Disconnected),
            ConnectionState::Disconnected
        );
        assert_eq!(
            ConnectionState::from(&ConnectionMachineState::Connecting),
            ConnectionState::Connecting
        );
        assert_eq!(
            ConnectionState::from(&ConnectionMachineState::Connected),
            ConnectionState::Connected
        );
        assert_eq!(
            ConnectionState::from(&ConnectionMachineState::Error),
            ConnectionState::Error
        );
    }

    #[test]
    fn test_is_terminal() {
        assert!(!ConnectionState::Disconnected.is_terminal());
        assert!(!ConnectionState::Connecting.is_terminal());
        assert!(!ConnectionState::Connected.is_terminal());
        assert!(ConnectionState::Error.is_terminal());
    }
}
