//! The table client runtime.
//!
//! Wires the session manager, relay, sync engine, and order lock together
//! and dispatches inbound server events. One instance per joined table;
//! callers hold it behind an `Arc`.

use crate::snapshot::SnapshotClient;
use crate::{ClientError, ClientResult};
use cart_config::Config;
use cart_pricing::MenuItemRef;
use cart_protocol::{AddonSelection, CartItem, Member, Order, ServerEvent, SessionCredentials};
use cart_storage::CredentialsManager;
use cart_sync::{new_tmp_id, MutationSink, SyncEngine};
use device_identity::DeviceId;
use order_lock::{OrderError, OrderEvent, OrderLock, OrderLockState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use table_relay::{ConnectionState, RelayClient, RelayConfig, RelayEvent};
use table_session::SessionManager;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Client runtime for one table session.
pub struct TableClient {
    session: Arc<SessionManager>,
    relay: Arc<RelayClient>,
    order_lock: Arc<OrderLock>,
    snapshot: SnapshotClient,
    engine: Arc<Mutex<Option<SyncEngine>>>,
    members: Mutex<Vec<Member>>,
    credentials: Mutex<Option<SessionCredentials>>,
    last_pong: Mutex<Option<Instant>>,
    was_connected: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TableClient {
    /// Create a new client from configuration and a credential store.
    pub fn new(config: &Config, credentials: Arc<CredentialsManager>) -> Self {
        let session = Arc::new(SessionManager::new(
            Arc::clone(&credentials),
            &config.api_url,
            config.fallback_api_urls.clone(),
        ));

        let relay_config = RelayConfig {
            ws_url: config.ws_url.clone(),
            ..Default::default()
        };
        let relay = Arc::new(RelayClient::new(relay_config, session.clone()));

        let sink: Arc<dyn MutationSink> = relay.clone();
        let order_lock = Arc::new(OrderLock::new(sink));

        Self {
            session,
            relay,
            order_lock,
            snapshot: SnapshotClient::new(&config.api_url),
            engine: Arc::new(Mutex::new(None)),
            members: Mutex::new(Vec::new()),
            credentials: Mutex::new(None),
            last_pong: Mutex::new(None),
            was_connected: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    // ==========================================
    // Lifecycle
    // ==========================================

    /// Join a table for the first time via the session handshake.
    pub async fn join(
        self: &Arc<Self>,
        table_pid: &str,
        token: &str,
        device_id: &DeviceId,
    ) -> ClientResult<SessionCredentials> {
        let creds = self
            .session
            .establish(table_pid, token, &device_id.to_string())
            .await?;
        self.activate(creds).await
    }

    /// Resume a previously joined table from persisted credentials.
    ///
    /// Returns `Ok(None)` when there is nothing to resume.
    pub async fn resume(self: &Arc<Self>) -> ClientResult<Option<SessionCredentials>> {
        match self.session.resume()? {
            Some(creds) => Ok(Some(self.activate(creds).await?)),
            None => Ok(None),
        }
    }

    /// Bring the runtime up for a session: refresh the token if it is near
    /// expiry, seed the cart from a snapshot, then open the cart channel.
    async fn activate(
        self: &Arc<Self>,
        creds: SessionCredentials,
    ) -> ClientResult<SessionCredentials> {
        let creds = if self.session.needs_refresh(&creds.ws_token) {
            info!("Websocket token near expiry, refreshing before connect");
            self.session.refresh().await?
        } else {
            creds
        };

        let snapshot = self
            .snapshot
            .fetch(&creds.session_pid, &creds.ws_token)
            .await?;

        {
            let sink: Arc<dyn MutationSink> = self.relay.clone();
            let mut engine = SyncEngine::new(creds.member_pid.clone(), sink);
            *self.members.lock().unwrap() = snapshot.members.clone();
            engine.seed_from_snapshot(snapshot);
            *self.engine.lock().unwrap() = Some(engine);
        }
        *self.credentials.lock().unwrap() = Some(creds.clone());

        self.wire_order_lock();

        // Subscribe before connecting so no event is missed
        let events = self.relay.subscribe();
        let loop_handle = tokio::spawn({
            let client = Arc::clone(self);
            async move { client.run_event_loop(events).await }
        });

        let connect_handle = tokio::spawn({
            let relay = Arc::clone(&self.relay);
            let session_pid = creds.session_pid.clone();
            let ws_token = creds.ws_token.clone();
            async move {
                if let Err(e) = relay.connect(&session_pid, &ws_token).await {
                    error!(error = %e, "Cart channel terminated");
                }
            }
        });

        let mut tasks = self.tasks.lock().unwrap();
        tasks.push(loop_handle);
        tasks.push(connect_handle);

        Ok(creds)
    }

    /// Keep the sync engine's lock flag in step with the order lock.
    fn wire_order_lock(&self) {
        let engine = Arc::clone(&self.engine);
        self.order_lock.set_event_callback(Box::new(move |event| {
            let mut guard = engine.lock().unwrap();
            if let Some(engine) = guard.as_mut() {
                match event {
                    OrderEvent::Locked { .. } => engine.set_locked(true),
                    OrderEvent::Confirmed { .. } => engine.clear_items(),
                    OrderEvent::Released => engine.set_locked(false),
                    OrderEvent::Failed { .. } => {}
                }
            }
        }));
    }

    /// Stop the runtime, keeping persisted credentials for a later resume.
    pub async fn shutdown(&self) {
        self.relay.disconnect().await;
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().unwrap().drain(..).collect();
        for task in tasks {
            task.abort();
        }
        info!("Table client shut down");
    }

    // ==========================================
    // Inbound events
    // ==========================================

    async fn run_event_loop(self: Arc<Self>, mut events: broadcast::Receiver<RelayEvent>) {
        loop {
            match events.recv().await {
                Ok(RelayEvent::Event(event)) => self.handle_server_event(event).await,
                Ok(RelayEvent::Connected) => {
                    // After any reconnect, converge through a fresh snapshot
                    // rather than trusting state from before the gap
                    if self.was_connected.swap(true, Ordering::SeqCst) {
                        if let Err(e) = self.resync().await {
                            warn!(error = %e, "Post-reconnect resync failed");
                        }
                    }
                }
                Ok(RelayEvent::Disconnected(reason)) => {
                    debug!(?reason, "Cart channel disconnected");
                }
                Ok(RelayEvent::Fatal(reason)) => {
                    error!(?reason, "Cart channel failed terminally");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event loop lagged, resyncing from snapshot");
                    if let Err(e) = self.resync().await {
                        warn!(error = %e, "Resync after lag failed");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn handle_server_event(self: &Arc<Self>, event: ServerEvent) {
        match event {
            ServerEvent::MemberJoin { member } => {
                let mut members = self.members.lock().unwrap();
                if !members.iter().any(|m| m.member_pid == member.member_pid) {
                    info!(member_pid = %member.member_pid, nickname = %member.nickname, "Member joined");
                    members.push(member);
                }
            }
            ServerEvent::CartUpdate {
                op,
                item,
                public_id,
                tmp_id,
                cart_version,
            } => {
                let mut guard = self.engine.lock().unwrap();
                if let Some(engine) = guard.as_mut() {
                    engine.reconcile(op, item, public_id.as_deref(), tmp_id.as_deref(), cart_version);
                }
            }
            ServerEvent::CartLocked {
                order_id,
                locked_by_member,
            } => {
                info!(order_id = %order_id, locked_by = %locked_by_member, "Cart locked by order");
                // Drives the order machine to Processing on non-initiating
                // devices; the Locked callback sets the engine's lock flag.
                self.order_lock.on_remote_lock(&locked_by_member);
            }
            ServerEvent::OrderConfirmed { order } => {
                self.order_lock.on_confirmed(order);
            }
            ServerEvent::OrderFailed { error } => {
                self.order_lock.on_failed(&error);
            }
            ServerEvent::TableClosed { message } => {
                warn!(message = %message, "Table closed by the restaurant");
                self.hard_reset().await;
            }
            ServerEvent::Pong => {
                *self.last_pong.lock().unwrap() = Some(Instant::now());
            }
            ServerEvent::Error { code, detail } => {
                if code == cart_protocol::ERROR_CODE_VERSION_CONFLICT {
                    {
                        let mut guard = self.engine.lock().unwrap();
                        if let Some(engine) = guard.as_mut() {
                            engine.handle_conflict(detail);
                        }
                    }
                    if let Err(e) = self.resync().await {
                        warn!(error = %e, "Resync after version conflict failed");
                    }
                } else {
                    warn!(code = %code, ?detail, "Server error");
                }
            }
        }
    }

    /// Re-seed local state from a fresh snapshot.
    async fn resync(&self) -> ClientResult<()> {
        let creds = match self.credentials.lock().unwrap().clone() {
            Some(creds) => creds,
            None => return Ok(()),
        };

        let snapshot = self
            .snapshot
            .fetch(&creds.session_pid, &creds.ws_token)
            .await?;

        *self.members.lock().unwrap() = snapshot.members.clone();
        let mut guard = self.engine.lock().unwrap();
        if let Some(engine) = guard.as_mut() {
            engine.seed_from_snapshot(snapshot);
        }
        Ok(())
    }

    /// Administrative close: drop credentials and return to pre-session state.
    async fn hard_reset(&self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session storage");
        }
        self.relay.disconnect().await;
        self.order_lock.hard_reset();
        *self.engine.lock().unwrap() = None;
        self.members.lock().unwrap().clear();
        *self.credentials.lock().unwrap() = None;
    }

    // ==========================================
    // Cart operations
    // ==========================================

    fn with_engine<T>(&self, f: impl FnOnce(&mut SyncEngine) -> ClientResult<T>) -> ClientResult<T> {
        let mut guard = self.engine.lock().unwrap();
        match guard.as_mut() {
            Some(engine) => f(engine),
            None => Err(ClientError::NotJoined),
        }
    }

    /// Add an item to the cart optimistically. Returns the temporary id the
    /// line is keyed by until the canonical create arrives.
    pub fn add_item(
        &self,
        menu_item: &MenuItemRef,
        qty: u32,
        note: &str,
        variation_id: Option<&str>,
        addons: &[AddonSelection],
    ) -> ClientResult<String> {
        let tmp_id = new_tmp_id();
        self.with_engine(|engine| {
            engine.add_optimistic(menu_item, qty, note, &tmp_id, variation_id, addons)?;
            Ok(())
        })?;
        Ok(tmp_id)
    }

    /// Update an item's quantity and note optimistically.
    pub fn update_item(
        &self,
        public_id: &str,
        qty: u32,
        note: &str,
        known_version: u64,
    ) -> ClientResult<()> {
        self.with_engine(|engine| Ok(engine.update_optimistic(public_id, qty, note, known_version)?))
    }

    /// Replace an item's menu item and customization optimistically.
    #[allow(clippy::too_many_arguments)]
    pub fn replace_item(
        &self,
        public_id: &str,
        menu_item: &MenuItemRef,
        qty: u32,
        note: &str,
        known_version: u64,
        variation_id: Option<&str>,
        addons: &[AddonSelection],
    ) -> ClientResult<()> {
        self.with_engine(|engine| {
            Ok(engine.replace_optimistic(
                public_id,
                menu_item,
                qty,
                note,
                known_version,
                variation_id,
                addons,
            )?)
        })
    }

    /// Delete an item optimistically.
    pub fn delete_item(&self, public_id: &str, known_version: u64) -> ClientResult<()> {
        self.with_engine(|engine| Ok(engine.delete_optimistic(public_id, known_version)?))
    }

    /// Submit the cart as an order.
    pub fn place_order(&self, special_instructions: &str) -> ClientResult<()> {
        let (total, member_pid) = {
            let guard = self.engine.lock().unwrap();
            let engine = guard.as_ref().ok_or(ClientError::NotJoined)?;
            if engine.is_empty() {
                return Err(OrderError::EmptyCart.into());
            }
            let creds = self.credentials.lock().unwrap();
            let creds = creds.as_ref().ok_or(ClientError::NotJoined)?;
            (engine.cart_total(), creds.member_pid.clone())
        };

        if !self.relay.is_connected() {
            return Err(OrderError::NotConnected.into());
        }

        self.order_lock
            .place_order(special_instructions, total, &member_pid)?;
        Ok(())
    }

    /// The table requires a shared password before mutations are sent.
    pub fn require_password(&self) -> ClientResult<()> {
        self.with_engine(|engine| {
            engine.require_password();
            Ok(())
        })
    }

    /// The shared password was validated; queued mutations flush in order.
    pub fn mark_password_validated(&self) -> ClientResult<()> {
        self.with_engine(|engine| {
            engine.mark_password_validated();
            Ok(())
        })
    }

    // ==========================================
    // Views
    // ==========================================

    /// Current cart items.
    pub fn items(&self) -> Vec<CartItem> {
        self.engine
            .lock()
            .unwrap()
            .as_ref()
            .map(|e| e.items().to_vec())
            .unwrap_or_default()
    }

    /// Whole-cart monotonic version.
    pub fn cart_version(&self) -> u64 {
        self.engine
            .lock()
            .unwrap()
            .as_ref()
            .map(|e| e.cart_version())
            .unwrap_or(0)
    }

    /// Sum of `final_price * qty` across the cart.
    pub fn cart_total(&self) -> i64 {
        self.engine
            .lock()
            .unwrap()
            .as_ref()
            .map(|e| e.cart_total())
            .unwrap_or(0)
    }

    /// Session members, join order.
    pub fn members(&self) -> Vec<Member> {
        self.members.lock().unwrap().clone()
    }

    /// Order history, newest first.
    pub fn order_history(&self) -> Vec<Order> {
        self.order_lock.order_history()
    }

    /// Current order lock state.
    pub fn lock_state(&self) -> OrderLockState {
        self.order_lock.state()
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.relay.state()
    }

    /// When the last pong arrived, if any.
    pub fn last_pong(&self) -> Option<Instant> {
        *self.last_pong.lock().unwrap()
    }

    /// Active session credentials, if joined.
    pub fn credentials(&self) -> Option<SessionCredentials> {
        self.credentials.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_protocol::{CartOp, CartSnapshot, OrderStatus};
    use cart_storage::MemoryStorage;
    use cart_sync::{SyncResult, SyncError};
    use cart_protocol::ClientMessage;

    struct NullSink;

    impl MutationSink for NullSink {
        fn deliver(&self, _msg: ClientMessage) -> SyncResult<()> {
            Ok(())
        }
    }

    fn test_client() -> Arc<TableClient> {
        let config = Config {
            api_url: "https://api.test.tablecart.app".to_string(),
            ws_url: "wss://api.test.tablecart.app/socket".to_string(),
            ..Default::default()
        };
        let credentials = Arc::new(CredentialsManager::new(Box::new(MemoryStorage::new())));
        Arc::new(TableClient::new(&config, credentials))
    }

    /// Install an engine directly, as `activate` would after a snapshot.
    fn install_engine(client: &Arc<TableClient>, member_pid: &str) {
        let sink: Arc<dyn MutationSink> = Arc::new(NullSink);
        let mut engine = SyncEngine::new(member_pid, sink);
        engine.seed_from_snapshot(CartSnapshot {
            items: Vec::new(),
            cart_version: 1,
            locked: false,
            members: Vec::new(),
            order_history: Vec::new(),
        });
        *client.engine.lock().unwrap() = Some(engine);
        client.wire_order_lock();
    }

    fn canonical_item(public_id: &str, member_pid: &str) -> CartItem {
        CartItem {
            public_id: public_id.to_string(),
            member_pid: member_pid.to_string(),
            menu_item_pid: "menu-1".to_string(),
            qty: 1,
            note: String::new(),
            selected_variation: None,
            selected_addons: Vec::new(),
            final_price: 500,
            version: 1,
            is_pending: false,
        }
    }

    #[test]
    fn test_operations_require_join() {
        let client = test_client();
        assert!(matches!(
            client.update_item("item-1", 2, "", 1),
            Err(ClientError::NotJoined)
        ));
        assert!(matches!(
            client.delete_item("item-1", 1),
            Err(ClientError::NotJoined)
        ));
        assert!(matches!(
            client.place_order(""),
            Err(ClientError::NotJoined)
        ));
    }

    #[test]
    fn test_views_before_join_are_empty() {
        let client = test_client();
        assert!(client.items().is_empty());
        assert_eq!(client.cart_version(), 0);
        assert_eq!(client.cart_total(), 0);
        assert!(client.members().is_empty());
        assert!(client.credentials().is_none());
        assert_eq!(client.lock_state(), OrderLockState::Idle);
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_member_join_appends_once() {
        let client = test_client();
        let member = Member {
            member_pid: "mem-2".to_string(),
            nickname: "Ada".to_string(),
            is_host: false,
        };

        client
            .handle_server_event(ServerEvent::MemberJoin {
                member: member.clone(),
            })
            .await;
        client
            .handle_server_event(ServerEvent::MemberJoin { member })
            .await;

        assert_eq!(client.members().len(), 1);
    }

    #[tokio::test]
    async fn test_cart_update_reconciles() {
        let client = test_client();
        install_engine(&client, "mem-1");

        client
            .handle_server_event(ServerEvent::CartUpdate {
                op: CartOp::Create,
                item: Some(canonical_item("item-1", "mem-2")),
                public_id: None,
                tmp_id: None,
                cart_version: 2,
            })
            .await;

        assert_eq!(client.items().len(), 1);
        assert_eq!(client.cart_version(), 2);
    }

    #[tokio::test]
    async fn test_cart_locked_blocks_mutations() {
        let client = test_client();
        install_engine(&client, "mem-1");

        client
            .handle_server_event(ServerEvent::CartUpdate {
                op: CartOp::Create,
                item: Some(canonical_item("item-1", "mem-1")),
                public_id: None,
                tmp_id: None,
                cart_version: 2,
            })
            .await;
        client
            .handle_server_event(ServerEvent::CartLocked {
                order_id: "order-1".to_string(),
                locked_by_member: "mem-2".to_string(),
            })
            .await;

        assert!(matches!(
            client.update_item("item-1", 3, "", 1),
            Err(ClientError::Sync(SyncError::CartLocked))
        ));
    }

    #[tokio::test]
    async fn test_order_confirmed_clears_cart_and_records_order() {
        let client = test_client();
        install_engine(&client, "mem-1");

        client
            .handle_server_event(ServerEvent::CartUpdate {
                op: CartOp::Create,
                item: Some(canonical_item("item-1", "mem-1")),
                public_id: None,
                tmp_id: None,
                cart_version: 2,
            })
            .await;

        // Lock locally first, as place_order would
        client.order_lock.place_order("", 500, "mem-1").unwrap();

        let order = Order {
            id: "order-1".to_string(),
            items: vec![canonical_item("item-1", "mem-1")],
            total: 500,
            initiated_by: "mem-1".to_string(),
            status: OrderStatus::Confirmed,
            timestamp: "2026-08-28T12:00:00Z".to_string(),
        };
        client
            .handle_server_event(ServerEvent::OrderConfirmed {
                order: order.clone(),
            })
            .await;

        assert!(client.items().is_empty());
        assert_eq!(client.order_history(), vec![order]);
        assert_eq!(client.lock_state(), OrderLockState::Idle);
        // Cart is editable again
        assert!(matches!(
            client.update_item("gone", 1, "", 1),
            Err(ClientError::Sync(SyncError::UnknownItem(_)))
        ));
    }

    #[tokio::test]
    async fn test_order_failed_keeps_cart() {
        let client = test_client();
        install_engine(&client, "mem-1");

        client
            .handle_server_event(ServerEvent::CartUpdate {
                op: CartOp::Create,
                item: Some(canonical_item("item-1", "mem-1")),
                public_id: None,
                tmp_id: None,
                cart_version: 2,
            })
            .await;

        client.order_lock.place_order("", 500, "mem-1").unwrap();
        client
            .handle_server_event(ServerEvent::OrderFailed {
                error: "kitchen closed".to_string(),
            })
            .await;

        assert_eq!(client.items().len(), 1);
        assert_eq!(client.lock_state(), OrderLockState::Idle);
        assert_eq!(
            client.order_lock.last_failure().as_deref(),
            Some("kitchen closed")
        );
    }

    #[tokio::test]
    async fn test_order_confirmed_on_other_device_clears_and_unlocks() {
        let client = test_client();
        install_engine(&client, "mem-1");

        client
            .handle_server_event(ServerEvent::CartUpdate {
                op: CartOp::Create,
                item: Some(canonical_item("item-1", "mem-2")),
                public_id: None,
                tmp_id: None,
                cart_version: 2,
            })
            .await;

        // mem-2 placed the order; this device only sees the broadcasts
        client
            .handle_server_event(ServerEvent::CartLocked {
                order_id: "order-1".to_string(),
                locked_by_member: "mem-2".to_string(),
            })
            .await;
        assert_eq!(client.lock_state(), OrderLockState::Processing);

        let order = Order {
            id: "order-1".to_string(),
            items: vec![canonical_item("item-1", "mem-2")],
            total: 500,
            initiated_by: "mem-2".to_string(),
            status: OrderStatus::Confirmed,
            timestamp: "2026-08-28T12:00:00Z".to_string(),
        };
        client
            .handle_server_event(ServerEvent::OrderConfirmed {
                order: order.clone(),
            })
            .await;

        assert!(client.items().is_empty());
        assert_eq!(client.order_history(), vec![order]);
        assert_eq!(client.lock_state(), OrderLockState::Idle);
        assert!(matches!(
            client.update_item("gone", 1, "", 1),
            Err(ClientError::Sync(SyncError::UnknownItem(_)))
        ));
    }

    #[tokio::test]
    async fn test_order_failed_on_other_device_unlocks_and_keeps_cart() {
        let client = test_client();
        install_engine(&client, "mem-1");

        client
            .handle_server_event(ServerEvent::CartUpdate {
                op: CartOp::Create,
                item: Some(canonical_item("item-1", "mem-2")),
                public_id: None,
                tmp_id: None,
                cart_version: 2,
            })
            .await;

        client
            .handle_server_event(ServerEvent::CartLocked {
                order_id: "order-1".to_string(),
                locked_by_member: "mem-2".to_string(),
            })
            .await;
        client
            .handle_server_event(ServerEvent::OrderFailed {
                error: "kitchen closed".to_string(),
            })
            .await;

        assert_eq!(client.items().len(), 1);
        assert_eq!(client.lock_state(), OrderLockState::Idle);
        // Cart is editable again
        assert!(matches!(
            client.update_item("item-1", 3, "", 1),
            Ok(())
        ));
    }

    #[tokio::test]
    async fn test_table_closed_resets_everything() {
        let client = test_client();
        install_engine(&client, "mem-1");
        *client.credentials.lock().unwrap() = Some(SessionCredentials {
            session_pid: "sess-1".to_string(),
            member_pid: "mem-1".to_string(),
            is_host: false,
            ws_token: "tok".to_string(),
            table_number: 4,
            restaurant_name: "Blue Lotus".to_string(),
        });

        client
            .handle_server_event(ServerEvent::TableClosed {
                message: "Closing time".to_string(),
            })
            .await;

        assert!(client.credentials().is_none());
        assert!(client.items().is_empty());
        assert!(client.members().is_empty());
        assert!(matches!(
            client.update_item("item-1", 1, "", 1),
            Err(ClientError::NotJoined)
        ));
    }

    #[tokio::test]
    async fn test_pong_marks_liveness() {
        let client = test_client();
        assert!(client.last_pong().is_none());

        client.handle_server_event(ServerEvent::Pong).await;
        assert!(client.last_pong().is_some());
    }

    #[tokio::test]
    async fn test_place_order_rejects_empty_cart() {
        let client = test_client();
        install_engine(&client, "mem-1");
        *client.credentials.lock().unwrap() = Some(SessionCredentials {
            session_pid: "sess-1".to_string(),
            member_pid: "mem-1".to_string(),
            is_host: false,
            ws_token: "tok".to_string(),
            table_number: 4,
            restaurant_name: "Blue Lotus".to_string(),
        });

        assert!(matches!(
            client.place_order(""),
            Err(ClientError::Order(OrderError::EmptyCart))
        ));
    }

    #[tokio::test]
    async fn test_place_order_requires_connection() {
        let client = test_client();
        install_engine(&client, "mem-1");
        *client.credentials.lock().unwrap() = Some(SessionCredentials {
            session_pid: "sess-1".to_string(),
            member_pid: "mem-1".to_string(),
            is_host: false,
            ws_token: "tok".to_string(),
            table_number: 4,
            restaurant_name: "Blue Lotus".to_string(),
        });

        client
            .handle_server_event(ServerEvent::CartUpdate {
                op: CartOp::Create,
                item: Some(canonical_item("item-1", "mem-1")),
                public_id: None,
                tmp_id: None,
                cart_version: 2,
            })
            .await;

        assert!(matches!(
            client.place_order(""),
            Err(ClientError::Order(OrderError::NotConnected))
        ));
    }
}
