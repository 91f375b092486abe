/*
[INPUT]:  WebSocket URL and subscription registrations
[OUTPUT]: Frames fanned out to callbacks, reconnecting across drops
[POS]:    WebSocket layer - connection lifecycle and dispatch loop
[UPDATE]: When heartbeat, backoff, or dispatch behavior changes
*/

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use super::mux::{Callback, MuxState, WireOp};
use super::subscriptions::{Subscription, WsMsg};
use crate::errors::{HyperliquidError, Result};

const PING_INTERVAL: Duration = Duration::from_secs(50);
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(30);
const MAX_RECONNECT_ATTEMPTS: u32 = 5;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Lifecycle notifications delivered to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsEvent {
    Connected,
    Disconnected,
    /// Reconnection gave up after the attempt budget; the manager is dead
    /// until `connect()` is called again.
    ReconnectExhausted,
}

#[derive(Serialize)]
struct MethodFrame<'a> {
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscription: Option<&'a Subscription>,
}

fn frame_for(op: &WireOp) -> Result<WsMessage> {
    let frame = match op {
        WireOp::Subscribe(subscription) => MethodFrame {
            method: "subscribe",
            subscription: Some(subscription),
        },
        WireOp::Unsubscribe(subscription) => MethodFrame {
            method: "unsubscribe",
            subscription: Some(subscription),
        },
    };
    Ok(WsMessage::Text(serde_json::to_string(&frame)?.into()))
}

fn ping_frame() -> WsMessage {
    WsMessage::Text(r#"{"method":"ping"}"#.to_string().into())
}

/// Why a socket session ended, seen from the driver.
enum SessionEnd {
    /// Local close: owner dropped the outbound sender.
    Closed,
    /// Peer close, read error, or stream end.
    Lost,
}

/// Outcome of the driver's backoff loop.
enum ReconnectOutcome {
    Resumed(WsStream, mpsc::Receiver<WsMessage>),
    /// A newer `connect()` owns the manager now; this driver stands down.
    Superseded,
    Exhausted,
}

/// Subscription-multiplexing WebSocket manager. One socket serves every
/// registered callback; drops reconnect with exponential backoff and
/// replay unless the owner closed on purpose. At most one session is live
/// at any time: each `connect()` bumps a generation counter, and a driver
/// whose generation is stale stands down instead of installing a second
/// session.
pub struct WsManager {
    url: String,
    state: Arc<Mutex<MuxState>>,
    outbound: Arc<AsyncMutex<Option<mpsc::Sender<WsMessage>>>>,
    force_close: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    event_tx: mpsc::Sender<WsEvent>,
    event_rx: Option<mpsc::Receiver<WsEvent>>,
}

impl WsManager {
    pub fn new(url: impl Into<String>) -> Self {
        let (event_tx, event_rx) = mpsc::channel(16);
        Self {
            url: url.into(),
            state: Arc::new(Mutex::new(MuxState::new())),
            outbound: Arc::new(AsyncMutex::new(None)),
            force_close: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Lifecycle event receiver; the first caller takes it.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<WsEvent>> {
        self.event_rx.take()
    }

    /// Dial the venue. Resolves once the socket is open and queued
    /// subscriptions are flushed; a dial failure here is returned to the
    /// caller rather than retried. Calling this while a driver is waiting
    /// out its backoff supersedes the automatic reconnect.
    pub async fn connect(&self) -> Result<()> {
        // Hold the session slot across the dial: concurrent connect calls
        // and an in-flight automatic reconnect serialize on this lock, so
        // only one of them can install a session.
        let mut guard = self.outbound.lock().await;
        if guard.is_some() {
            return Err(HyperliquidError::WebSocket(
                "already connected".to_string(),
            ));
        }
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.force_close.store(false, Ordering::SeqCst);

        let stream = dial(&self.url).await?;
        let (tx, outbound_rx) = mpsc::channel(100);
        *guard = Some(tx);
        drop(guard);

        self.flush_open_frames().await?;
        let _ = self.event_tx.send(WsEvent::Connected).await;

        let driver = Driver {
            url: self.url.clone(),
            state: self.state.clone(),
            outbound: self.outbound.clone(),
            force_close: self.force_close.clone(),
            generation: self.generation.clone(),
            token,
            event_tx: self.event_tx.clone(),
        };
        tokio::spawn(driver.run(stream, outbound_rx));
        Ok(())
    }

    /// Stop for good: suppresses reconnection and closes the socket.
    pub async fn close(&self) {
        self.force_close.store(true, Ordering::SeqCst);
        let mut guard = self.outbound.lock().await;
        // Dropping the sender ends the driver's outbound stream, which
        // sends a close frame and exits.
        guard.take();
    }

    /// Register a callback for a feed. Returns a local id for later
    /// unsubscription. While disconnected the registration queues and
    /// flushes on the next open.
    pub async fn subscribe(
        &self,
        subscription: Subscription,
        callback: Callback,
    ) -> Result<u32> {
        let (id, op) = {
            let mut state = self.state.lock().map_err(lock_poisoned)?;
            state.register(subscription, callback)?
        };
        if let Some(op) = op {
            self.send_op(&op).await?;
        }
        Ok(id)
    }

    /// Remove one callback by id. The venue-side unsubscribe only goes
    /// out when the last callback for the feed is removed. Returns
    /// whether a callback was actually removed.
    pub async fn unsubscribe(&self, subscription: &Subscription, id: u32) -> Result<bool> {
        let (removed, op) = {
            let mut state = self.state.lock().map_err(lock_poisoned)?;
            state.unregister(subscription, id)
        };
        if let Some(op) = op {
            self.send_op(&op).await?;
        }
        Ok(removed)
    }

    async fn flush_open_frames(&self) -> Result<()> {
        let ops = {
            let mut state = self.state.lock().map_err(lock_poisoned)?;
            state.on_open()
        };
        for op in &ops {
            self.send_op(op).await?;
        }
        Ok(())
    }

    async fn send_op(&self, op: &WireOp) -> Result<()> {
        let sender = {
            let guard = self.outbound.lock().await;
            guard.clone()
        };
        let Some(sender) = sender else {
            // Lost the socket between the state transition and the send;
            // the reconnect replay will re-issue subscriptions.
            debug!("no active socket, frame deferred to replay");
            return Ok(());
        };
        sender
            .send(frame_for(op)?)
            .await
            .map_err(|_| HyperliquidError::WebSocket("send channel closed".to_string()))
    }
}

fn lock_poisoned<T>(_: std::sync::PoisonError<T>) -> HyperliquidError {
    HyperliquidError::WebSocket("multiplexer lock poisoned".to_string())
}

async fn dial(url: &str) -> Result<WsStream> {
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|e| HyperliquidError::WebSocket(e.to_string()))?;
    Ok(stream)
}

/// Owns one socket session at a time and reconnects across drops. `token`
/// is the generation this driver was spawned under; once a newer
/// `connect()` bumps the shared counter, this driver no longer touches
/// shared state and exits at the next opportunity.
struct Driver {
    url: String,
    state: Arc<Mutex<MuxState>>,
    outbound: Arc<AsyncMutex<Option<mpsc::Sender<WsMessage>>>>,
    force_close: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    token: u64,
    event_tx: mpsc::Sender<WsEvent>,
}

impl Driver {
    fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.token
    }

    async fn run(self, stream: WsStream, outbound_rx: mpsc::Receiver<WsMessage>) {
        let mut stream = stream;
        let mut outbound_rx = outbound_rx;
        loop {
            let end = self.run_session(stream, &mut outbound_rx).await;
            self.on_session_end().await;

            if matches!(end, SessionEnd::Closed) || self.force_close.load(Ordering::SeqCst) {
                info!("websocket closed");
                return;
            }

            match self.reconnect().await {
                ReconnectOutcome::Resumed(next_stream, next_rx) => {
                    stream = next_stream;
                    outbound_rx = next_rx;
                }
                ReconnectOutcome::Superseded => {
                    debug!("driver superseded by a newer connection");
                    return;
                }
                ReconnectOutcome::Exhausted => {
                    warn!(
                        attempts = MAX_RECONNECT_ATTEMPTS,
                        "websocket reconnection exhausted"
                    );
                    let _ = self.event_tx.send(WsEvent::ReconnectExhausted).await;
                    return;
                }
            }
        }
    }

    async fn run_session(
        &self,
        stream: WsStream,
        outbound_rx: &mut mpsc::Receiver<WsMessage>,
    ) -> SessionEnd {
        let (mut write, mut read) = stream.split();
        let mut ping = tokio::time::interval(PING_INTERVAL);
        ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; the socket just opened.
        ping.tick().await;

        loop {
            tokio::select! {
                _ = ping.tick() => {
                    if write.send(ping_frame()).await.is_err() {
                        return SessionEnd::Lost;
                    }
                }
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(message) => {
                            if write.send(message).await.is_err() {
                                return SessionEnd::Lost;
                            }
                        }
                        None => {
                            let _ = write.send(WsMessage::Close(None)).await;
                            return SessionEnd::Closed;
                        }
                    }
                }
                incoming = read.next() => {
                    match incoming {
                        Some(Ok(WsMessage::Close(_))) => {
                            let _ = write.send(WsMessage::Close(None)).await;
                            return SessionEnd::Lost;
                        }
                        Some(Ok(WsMessage::Ping(payload))) => {
                            let _ = write.send(WsMessage::Pong(payload)).await;
                        }
                        Some(Ok(WsMessage::Pong(_))) => {}
                        Some(Ok(message)) => self.dispatch(message),
                        Some(Err(e)) => {
                            warn!(error = %e, "websocket read error");
                            return SessionEnd::Lost;
                        }
                        None => return SessionEnd::Lost,
                    }
                }
            }
        }
    }

    /// Malformed frames are logged and dropped; a bad frame must never
    /// take the connection down.
    fn dispatch(&self, message: WsMessage) {
        let text = match message {
            WsMessage::Text(text) => text.to_string(),
            WsMessage::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    debug!("dropping non-utf8 binary frame");
                    return;
                }
            },
            _ => return,
        };
        // Greeting sent by the venue before any JSON frame.
        if text == "Websocket connection established." {
            debug!("venue greeting received");
            return;
        }
        let msg: WsMsg = match serde_json::from_str(&text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, bytes = text.len(), "dropping malformed frame");
                return;
            }
        };
        match self.state.lock() {
            Ok(state) => {
                let fired = state.route(&msg);
                if fired == 0 {
                    debug!(channel = %msg.channel, "frame had no subscribers");
                }
            }
            Err(_) => warn!("multiplexer lock poisoned, frame dropped"),
        }
    }

    /// Tear down this driver's session. A stale driver must not touch the
    /// slot or the multiplexer: they belong to the newer connection.
    async fn on_session_end(&self) {
        {
            let mut guard = self.outbound.lock().await;
            if self.is_current() {
                guard.take();
            }
        }
        if !self.is_current() {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.on_close();
        }
        let _ = self.event_tx.send(WsEvent::Disconnected).await;
    }

    /// Exponential backoff: 1 s doubling to a 30 s cap, five attempts.
    /// Stands down without dialing if a manual `connect()` took over
    /// during the sleep.
    async fn reconnect(&self) -> ReconnectOutcome {
        let mut delay = BACKOFF_BASE;
        for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
            tokio::time::sleep(delay).await;
            if self.force_close.load(Ordering::SeqCst) || !self.is_current() {
                return ReconnectOutcome::Superseded;
            }
            info!(attempt, "websocket reconnecting");
            match dial(&self.url).await {
                Ok(stream) => {
                    let (tx, rx) = mpsc::channel(100);
                    {
                        let mut guard = self.outbound.lock().await;
                        // A manual connect may have won the slot while the
                        // dial was in flight.
                        if !self.is_current() || guard.is_some() {
                            return ReconnectOutcome::Superseded;
                        }
                        *guard = Some(tx);
                    }
                    if let Err(e) = self.replay().await {
                        warn!(error = %e, "subscription replay failed");
                    }
                    let _ = self.event_tx.send(WsEvent::Connected).await;
                    return ReconnectOutcome::Resumed(stream, rx);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "websocket reconnect failed");
                    delay = (delay * 2).min(BACKOFF_CAP);
                }
            }
        }
        ReconnectOutcome::Exhausted
    }

    /// Queue the on-open frames through the freshly installed outbound
    /// channel; the session loop sends them once it starts.
    async fn replay(&self) -> Result<()> {
        let ops = {
            let mut state = self.state.lock().map_err(lock_poisoned)?;
            state.on_open()
        };
        let sender = {
            let guard = self.outbound.lock().await;
            guard.clone()
        };
        let Some(sender) = sender else {
            return Ok(());
        };
        for op in &ops {
            sender
                .send(frame_for(op)?)
                .await
                .map_err(|_| HyperliquidError::WebSocket("send channel closed".to_string()))?;
        }
        Ok(())
    }
}
