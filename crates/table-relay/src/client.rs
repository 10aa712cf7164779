//! WebSocket client for the table's cart channel.

use crate::machine::{ConnectionInput, ConnectionMachine, ConnectionState};
use crate::{RelayError, RelayResult};
use async_trait::async_trait;
use cart_protocol::{ClientMessage, ServerEvent};
use cart_sync::{MutationSink, SyncError, SyncResult};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::{interval, Duration};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use url::Url;

/// Close code the server sends when the websocket token is rejected.
pub const CLOSE_CODE_AUTH_FAILURE: u16 = 4001;

/// Close code the server sends when the table's device limit is reached.
pub const CLOSE_CODE_CONNECTION_LIMIT: u16 = 4002;

/// Relay client configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Websocket endpoint (e.g., wss://api.tablecart.app/socket).
    pub ws_url: String,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Base reconnect delay in milliseconds.
    pub reconnect_base_delay_ms: u64,
    /// Maximum reconnect delay in milliseconds.
    pub reconnect_max_delay_ms: u64,
    /// Maximum reconnect attempts before giving up.
    pub max_reconnect_attempts: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ws_url: "wss://api.tablecart.app/socket".to_string(),
            heartbeat_interval_secs: 30,
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 10_000,
            max_reconnect_attempts: 5,
        }
    }
}

impl RelayConfig {
    /// Exponential backoff delay in milliseconds for a zero-based attempt.
    pub fn backoff_delay(&self, attempt: u32) -> u64 {
        std::cmp::min(
            self.reconnect_base_delay_ms * 2u64.pow(attempt),
            self.reconnect_max_delay_ms,
        )
    }
}

/// Why the client stopped reconnecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalReason {
    /// The consecutive-retry budget ran out.
    RetriesExhausted,
    /// The server refused the connection because the table's device limit
    /// is reached. Reconnecting would be refused again.
    ConnectionLimit,
}

/// Events emitted by the relay client.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// The cart channel is open.
    Connected,
    /// The cart channel dropped, with the server's close reason if any.
    Disconnected(Option<String>),
    /// A server event arrived on the channel.
    Event(ServerEvent),
    /// The client gave up; manual restart required.
    Fatal(FatalReason),
}

/// Supplies a fresh websocket token after an auth-failure close.
///
/// The session layer implements this; the relay calls it at most once per
/// disconnect before falling back to counted retries.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_ws_token(&self) -> RelayResult<String>;
}

/// WebSocket client with automatic reconnection and heartbeat.
pub struct RelayClient {
    config: RelayConfig,
    machine: Mutex<ConnectionMachine>,
    sender: Mutex<Option<mpsc::Sender<Message>>>,
    event_tx: broadcast::Sender<RelayEvent>,
    session_pid: RwLock<Option<String>>,
    ws_token: RwLock<Option<String>>,
    refresher: Arc<dyn TokenRefresher>,
    reconnect_attempts: AtomicU32,
    auth_retry_done: AtomicBool,
    shutdown: AtomicBool,
    dropped_messages: AtomicU64,
}

impl RelayClient {
    /// Create a new relay client.
    pub fn new(config: RelayConfig, refresher: Arc<dyn TokenRefresher>) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            config,
            machine: Mutex::new(ConnectionMachine::new()),
            sender: Mutex::new(None),
            event_tx,
            session_pid: RwLock::new(None),
            ws_token: RwLock::new(None),
            refresher,
            reconnect_attempts: AtomicU32::new(0),
            auth_retry_done: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Subscribe to relay events.
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.event_tx.subscribe()
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from(self.machine.lock().unwrap().state())
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Messages dropped because the channel was down. Diagnostic only.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped_messages.load(Ordering::SeqCst)
    }

    /// Drive the connection machine, ignoring inputs invalid for the
    /// current state.
    fn transition(&self, input: ConnectionInput) {
        let mut machine = self.machine.lock().unwrap();
        if machine.consume(&input).is_err() {
            debug!(?input, state = ?machine.state(), "Ignoring invalid connection transition");
        }
    }

    /// Connect to the cart channel and pump events until shutdown.
    ///
    /// Runs for the connection's lifetime, reconnecting internally; callers
    /// spawn it. Returns once the client shuts down or gives up.
    pub async fn connect(&self, session_pid: &str, ws_token: &str) -> RelayResult<()> {
        let state = self.state();
        if state.is_terminal() {
            return Err(RelayError::Terminal);
        }
        if state != ConnectionState::Disconnected {
            debug!("Already connecting or connected");
            return Ok(());
        }

        // Store credentials for reconnection
        *self.session_pid.write().await = Some(session_pid.to_string());
        *self.ws_token.write().await = Some(ws_token.to_string());

        self.shutdown.store(false, Ordering::SeqCst);
        self.reconnect_attempts.store(0, Ordering::SeqCst);
        self.auth_retry_done.store(false, Ordering::SeqCst);

        self.do_connect().await
    }

    /// Replace the websocket token used on the next dial.
    pub async fn set_ws_token(&self, token: &str) {
        *self.ws_token.write().await = Some(token.to_string());
    }

    /// Internal connect implementation.
    async fn do_connect(&self) -> RelayResult<()> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.transition(ConnectionInput::Connect);
        let url = self.build_url().await?;
        info!(url = %self.config.ws_url, "Connecting to cart channel");

        let ws_stream = match connect_async(url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                warn!(error = %e, "WebSocket connect failed");
                self.transition(ConnectionInput::Retry);
                return self.schedule_reconnect().await;
            }
        };
        let (mut write, mut read) = ws_stream.split();

        // Create message channel
        let (msg_tx, mut msg_rx) = mpsc::channel::<Message>(100);
        *self.sender.lock().unwrap() = Some(msg_tx.clone());

        self.transition(ConnectionInput::Opened);
        self.reconnect_attempts.store(0, Ordering::SeqCst);
        self.auth_retry_done.store(false, Ordering::SeqCst);
        info!("Cart channel open");
        let _ = self.event_tx.send(RelayEvent::Connected);

        // Spawn message sender task
        let sender_handle = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                if write.send(msg).await.is_err() {
                    break;
                }
            }
        });

        // Liveness probe; the server answers with a pong event
        let ping = ClientMessage::Ping.to_json()?;
        let _ = msg_tx.send(Message::Text(ping.into())).await;

        // Spawn heartbeat task
        let heartbeat_sender = msg_tx.clone();
        let heartbeat_secs = self.config.heartbeat_interval_secs;
        let heartbeat_handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(heartbeat_secs));
            // first tick completes immediately; the initial ping covers it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Ok(json) = ClientMessage::Ping.to_json() {
                    if heartbeat_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
        });

        // Process incoming messages
        let mut close_frame: Option<CloseFrame> = None;
        while let Some(msg_result) = read.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match ServerEvent::from_json(&text) {
                    Ok(event) => {
                        let _ = self.event_tx.send(RelayEvent::Event(event));
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to parse server event");
                    }
                },
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "Cart channel closed by server");
                    close_frame = frame;
                    break;
                }
                Ok(Message::Ping(data)) => {
                    let sender = self.sender.lock().unwrap().clone();
                    if let Some(sender) = sender {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "WebSocket error");
                    break;
                }
            }
        }

        // Cleanup
        heartbeat_handle.abort();
        sender_handle.abort();
        *self.sender.lock().unwrap() = None;
        self.transition(ConnectionInput::Closed);

        let reason = close_frame.as_ref().map(|f| f.reason.to_string());
        let _ = self.event_tx.send(RelayEvent::Disconnected(reason));

        if self.shutdown.load(Ordering::SeqCst) {
            info!("Cart channel shut down");
            return Ok(());
        }

        self.handle_close(close_frame).await
    }

    /// Build the connect URL with session credentials as query parameters.
    async fn build_url(&self) -> RelayResult<Url> {
        let session_pid = self
            .session_pid
            .read()
            .await
            .clone()
            .ok_or_else(|| RelayError::Authentication("No session".to_string()))?;
        let ws_token = self
            .ws_token
            .read()
            .await
            .clone()
            .ok_or_else(|| RelayError::Authentication("No websocket token".to_string()))?;

        let mut url = Url::parse(&self.config.ws_url)?;
        url.query_pairs_mut()
            .append_pair("session_pid", &session_pid)
            .append_pair("ws_token", &ws_token);
        Ok(url)
    }

    /// Decide what an unexpected close means for reconnection.
    async fn handle_close(&self, frame: Option<CloseFrame>) -> RelayResult<()> {
        let code = frame.as_ref().map(|f| u16::from(f.code));

        match code {
            Some(CLOSE_CODE_AUTH_FAILURE) => {
                if self.auth_retry_done.swap(true, Ordering::SeqCst) {
                    warn!("Token rejected again after refresh; falling back to counted retries");
                    return self.schedule_reconnect().await;
                }

                info!("Websocket token rejected; refreshing");
                match self.refresher.refresh_ws_token().await {
                    Ok(token) => {
                        *self.ws_token.write().await = Some(token);
                        // refresh-driven retry does not consume the backoff budget
                        Box::pin(self.do_connect()).await
                    }
                    Err(e) => {
                        warn!(error = %e, "Token refresh failed");
                        self.schedule_reconnect().await
                    }
                }
            }
            Some(CLOSE_CODE_CONNECTION_LIMIT) => {
                error!("Device limit reached for this table; not reconnecting");
                self.transition(ConnectionInput::Fatal);
                let _ = self.event_tx.send(RelayEvent::Fatal(FatalReason::ConnectionLimit));
                Ok(())
            }
            _ => self.schedule_reconnect().await,
        }
    }

    /// Wait out the backoff delay and reconnect, or give up.
    async fn schedule_reconnect(&self) -> RelayResult<()> {
        let attempt = self.reconnect_attempts.load(Ordering::SeqCst);
        if attempt >= self.config.max_reconnect_attempts {
            error!(attempts = attempt, "Reconnect budget exhausted");
            self.transition(ConnectionInput::Fatal);
            let _ = self.event_tx.send(RelayEvent::Fatal(FatalReason::RetriesExhausted));
            return Ok(());
        }

        let delay = self.config.backoff_delay(attempt);
        self.reconnect_attempts.store(attempt + 1, Ordering::SeqCst);
        info!(attempt = attempt + 1, delay_ms = delay, "Scheduling reconnect");

        tokio::time::sleep(Duration::from_millis(delay)).await;

        if self.shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }
        Box::pin(self.do_connect()).await
    }

    /// Disconnect and stop reconnecting.
    pub async fn disconnect(&self) {
        self.shutdown.store(true, Ordering::SeqCst);

        if let Some(sender) = self.sender.lock().unwrap().take() {
            drop(sender);
        }

        *self.session_pid.write().await = None;
        *self.ws_token.write().await = None;

        info!("Disconnected from cart channel");
    }

    /// Send a client message over the channel.
    pub fn send_message(&self, msg: ClientMessage) -> RelayResult<()> {
        let json = msg.to_json()?;
        let sender = self.sender.lock().unwrap().clone();
        let sender = sender.ok_or(RelayError::NotConnected)?;

        sender
            .try_send(Message::Text(json.into()))
            .map_err(|e| RelayError::Send(e.to_string()))
    }
}

impl MutationSink for RelayClient {
    /// Deliver an outbound message, dropping it if the channel is down.
    ///
    /// Disconnected sends succeed from the caller's perspective: the sync
    /// engine keeps its optimistic state and the snapshot taken on
    /// reconnect supersedes whatever was lost.
    fn deliver(&self, msg: ClientMessage) -> SyncResult<()> {
        if !self.is_connected() {
            let dropped = self.dropped_messages.fetch_add(1, Ordering::SeqCst) + 1;
            warn!(total_dropped = dropped, "Dropping outbound message while disconnected");
            return Ok(());
        }

        match self.send_message(msg) {
            Ok(()) => Ok(()),
            Err(RelayError::NotConnected) => {
                // Raced a disconnect; same policy as above
                let dropped = self.dropped_messages.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(total_dropped = dropped, "Dropping outbound message while disconnected");
                Ok(())
            }
            Err(e) => Err(SyncError::Sink(e.to_string())),
        }
    }
}
