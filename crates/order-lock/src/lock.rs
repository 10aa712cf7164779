//! The order lock runtime.

use crate::{OrderError, OrderLockState, OrderMachine, OrderMachineInput, OrderResult};
use cart_protocol::{ClientMessage, Order};
use cart_sync::MutationSink;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounded wait for the server's order outcome before the lock self-releases.
pub const ORDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Events emitted as the lock moves through an order's lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    /// The cart is now locked by an in-flight order.
    Locked { initiated_by: String },
    /// The order was confirmed; the cart folds into it.
    Confirmed { order: Order },
    /// The order failed or timed out; the cart is left intact.
    Failed { reason: String },
    /// The lock was released back to Idle.
    Released,
}

/// Callback type for order lifecycle events.
pub type OrderEventCallback = Box<dyn Fn(OrderEvent) + Send + Sync>;

struct LockInner {
    machine: OrderMachine,
    /// Member that initiated the in-flight order.
    initiated_by: Option<String>,
    /// Monotonic guard so a timer from a superseded placement is ignored.
    generation: u64,
    /// Order history, newest first.
    history: Vec<Order>,
    /// Reason for the most recent failure.
    last_failure: Option<String>,
}

/// Governs the editable-cart → order-submitted → confirmed/failed cycle.
///
/// Shared by handle; the timeout task holds a clone and checks a generation
/// counter so late outcomes never touch a newer placement.
pub struct OrderLock {
    inner: Mutex<LockInner>,
    sink: Arc<dyn MutationSink>,
    timeout: Duration,
    event_callback: Mutex<Option<OrderEventCallback>>,
}

impl OrderLock {
    /// Create a new order lock delivering `place_order` through the sink.
    pub fn new(sink: Arc<dyn MutationSink>) -> Self {
        Self::with_timeout(sink, ORDER_TIMEOUT)
    }

    /// Create with a custom outcome timeout.
    pub fn with_timeout(sink: Arc<dyn MutationSink>, timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(LockInner {
                machine: OrderMachine::new(),
                initiated_by: None,
                generation: 0,
                history: Vec::new(),
                last_failure: None,
            }),
            sink,
            timeout,
            event_callback: Mutex::new(None),
        }
    }

    /// Set a callback for order lifecycle events.
    pub fn set_event_callback(&self, callback: OrderEventCallback) {
        *self.event_callback.lock().unwrap() = Some(callback);
    }

    fn emit(&self, event: OrderEvent) {
        let cb = self.event_callback.lock().unwrap();
        if let Some(callback) = cb.as_ref() {
            callback(event);
        }
    }

    /// Current lock state.
    pub fn state(&self) -> OrderLockState {
        let inner = self.inner.lock().unwrap();
        OrderLockState::from(inner.machine.state())
    }

    /// Order history, newest first.
    pub fn order_history(&self) -> Vec<Order> {
        self.inner.lock().unwrap().history.clone()
    }

    /// Reason for the most recent failure, if any.
    pub fn last_failure(&self) -> Option<String> {
        self.inner.lock().unwrap().last_failure.clone()
    }

    /// Member that initiated the in-flight order, while Processing.
    pub fn initiated_by(&self) -> Option<String> {
        self.inner.lock().unwrap().initiated_by.clone()
    }

    /// Submit the cart as an order.
    ///
    /// Allowed only from Idle; the caller has already verified the cart is
    /// non-empty and the channel is open. Transitions to Processing, records
    /// the initiating member, sends `place_order` with the currently
    /// computed total, and starts the bounded outcome timeout.
    pub fn place_order(
        self: &Arc<Self>,
        special_instructions: &str,
        total: i64,
        member_pid: &str,
    ) -> OrderResult<()> {
        let generation = {
            let mut inner = self.inner.lock().unwrap();
            inner
                .machine
                .consume(&OrderMachineInput::PlaceOrder)
                .map_err(|_| {
                    OrderError::InvalidStateTransition(format!(
                        "Cannot place an order in state {:?}",
                        inner.machine.state()
                    ))
                })?;
            inner.initiated_by = Some(member_pid.to_string());
            inner.last_failure = None;
            inner.generation += 1;
            inner.generation
        };

        info!(member_pid, total, "Order placed, cart locked");
        self.emit(OrderEvent::Locked {
            initiated_by: member_pid.to_string(),
        });

        if let Err(e) = self.sink.deliver(ClientMessage::PlaceOrder {
            special_instructions: special_instructions.to_string(),
            total,
        }) {
            // The timeout path will unlock; the server never saw the order.
            warn!(error = %e, "Failed to send place_order");
        }

        let lock = Arc::clone(self);
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            lock.on_timeout(generation);
        });

        Ok(())
    }

    /// Another member placed an order; mirror the lock locally.
    ///
    /// The `cart_locked` broadcast reaches every device, including the
    /// initiator whose machine is already Processing; there the invalid
    /// transition is ignored. Everyone else moves to Processing so the
    /// outcome broadcast releases them too, with the same bounded timeout
    /// in case that outcome is lost.
    pub fn on_remote_lock(self: &Arc<Self>, locked_by: &str) {
        let generation = {
            let mut inner = self.inner.lock().unwrap();
            if inner
                .machine
                .consume(&OrderMachineInput::PlaceOrder)
                .is_err()
            {
                debug!("Already locked; ignoring remote lock");
                return;
            }
            inner.initiated_by = Some(locked_by.to_string());
            inner.last_failure = None;
            inner.generation += 1;
            inner.generation
        };

        info!(locked_by, "Cart locked by another member's order");
        self.emit(OrderEvent::Locked {
            initiated_by: locked_by.to_string(),
        });

        let lock = Arc::clone(self);
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            lock.on_timeout(generation);
        });
    }

    /// Server confirmed the order: record it at the head of history and
    /// release the lock immediately.
    pub fn on_confirmed(&self, order: Order) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner
                .machine
                .consume(&OrderMachineInput::ServerConfirmed)
                .is_err()
            {
                debug!("Ignoring order_confirmed outside Processing");
                return;
            }
            inner.history.insert(0, order.clone());
            inner.initiated_by = None;
            // Confirmed is momentary; release right away.
            let _ = inner.machine.consume(&OrderMachineInput::Acknowledge);
        }

        info!(order_id = %order.id, "Order confirmed");
        self.emit(OrderEvent::Confirmed { order });
        self.emit(OrderEvent::Released);
    }

    /// Server reported failure: release the lock, cart left intact.
    pub fn on_failed(&self, reason: &str) {
        if !self.fail(reason) {
            debug!("Ignoring order_failed outside Processing");
        }
    }

    fn on_timeout(&self, generation: u64) {
        {
            let inner = self.inner.lock().unwrap();
            if inner.generation != generation {
                return;
            }
        }
        if self.fail("Timed out waiting for order confirmation") {
            warn!("Order timed out, unlocking cart");
        }
    }

    /// Move Processing → Failed → Idle. Returns false when not Processing.
    fn fail(&self, reason: &str) -> bool {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner
                .machine
                .consume(&OrderMachineInput::ServerFailed)
                .is_err()
            {
                return false;
            }
            inner.last_failure = Some(reason.to_string());
            inner.initiated_by = None;
            let _ = inner.machine.consume(&OrderMachineInput::Acknowledge);
        }

        self.emit(OrderEvent::Failed {
            reason: reason.to_string(),
        });
        self.emit(OrderEvent::Released);
        true
    }

    /// Administrative table close: hard reset to Idle, history cleared.
    pub fn hard_reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.machine = OrderMachine::new();
        inner.initiated_by = None;
        inner.history.clear();
        inner.last_failure = None;
        inner.generation += 1;
        info!("Order lock hard reset");
    }
}
