use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{sink::SinkExt, stream::StreamExt, Sink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use super::buffer::OverlayBuffer;
use crate::backend::render::RenderedMessage;

/// Maximum number of events buffered per overlay client
const CHANNEL_CAPACITY: usize = 256;

/// Shared state for WebSocket connections
#[derive(Clone)]
pub struct WebSocketState {
    /// Broadcast channel for sending events to all connected overlays
    tx: broadcast::Sender<OverlayEvent>,
    /// Counter for connected clients
    client_count: Arc<RwLock<usize>>,
    buffer: OverlayBuffer,
}

impl WebSocketState {
    pub fn new(max_messages: usize, grace: Duration) -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        let buffer = OverlayBuffer::new(max_messages, grace, tx.clone());
        Self {
            tx,
            client_count: Arc::new(RwLock::new(0)),
            buffer,
        }
    }

    /// The message buffer whose changes this state broadcasts
    pub fn buffer(&self) -> &OverlayBuffer {
        &self.buffer
    }

    /// Send an event to all connected overlay clients
    pub fn broadcast(&self, event: OverlayEvent) {
        if let Err(e) = self.tx.send(event) {
            log::trace!("No overlay clients for event: {}", e);
        }
    }

    /// Get the number of connected clients
    pub async fn client_count(&self) -> usize {
        *self.client_count.read().await
    }

    /// Ping connected overlays at a fixed interval; abort the handle to stop
    pub fn spawn_keepalive(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.receiver_count() > 0 {
                    log::trace!("Pinging overlay clients");
                    let _ = tx.send(OverlayEvent::Ping);
                }
            }
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OverlayEvent> {
        self.tx.subscribe()
    }
}

/// Events sent to the overlay page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayEvent {
    /// Full buffer, sent once to each new client
    Snapshot { messages: Vec<RenderedMessage> },
    MessageAdded { message: RenderedMessage },
    /// Start the exit animation; removal follows after the grace period
    MessageEvicting { id: u64 },
    MessageRemoved { id: u64 },
    /// Chat connected, with a banner to show
    Connected { banner: String },
    Disconnected { reason: String },
    /// Ping to keep connection alive
    Ping,
}

/// WebSocket handler for overlay connections
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<WebSocketState>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    {
        let mut count = state.client_count.write().await;
        *count += 1;
        log::info!("Overlay client connected. Total clients: {}", *count);
    }

    let (mut sender, mut receiver) = socket.split();

    let (messages, rx) = state.buffer.snapshot_and_subscribe().await;
    let mut events = BroadcastStream::new(rx);
    let snapshot = OverlayEvent::Snapshot { messages };

    let mut send_task = tokio::spawn(async move {
        if !send_event(&mut sender, &snapshot).await {
            return;
        }
        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    log::warn!("Overlay client lagging, skipped {} events", skipped);
                    continue;
                }
            };
            if !send_event(&mut sender, &event).await {
                log::debug!("Client disconnected during send");
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => {
                    log::debug!("Client sent close message");
                    break;
                }
                Message::Text(text) => {
                    log::debug!("Ignoring message from overlay client: {}", text);
                }
                Message::Ping(_) | Message::Pong(_) => {
                    log::trace!("Control frame from overlay client");
                }
                _ => {}
            }
        }
    });

    // Either task finishing means the connection is done
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    {
        let mut count = state.client_count.write().await;
        *count = count.saturating_sub(1);
        log::info!("Overlay client disconnected. Total clients: {}", *count);
    }
}

/// Returns false once the client is gone
async fn send_event<S>(sender: &mut S, event: &OverlayEvent) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to serialize overlay event: {}", e);
            return true;
        }
    };
    sender.send(Message::Text(json)).await.is_ok()
}
