use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};

use super::websocket::{
    backoff_delay, normalize_channel, ConnectionState, IrcCredentials, WebSocketHandler,
    WebSocketMessage, DEFAULT_IRC_URL,
};
use super::messages::ChatMessageEvent;

/// A session that stayed up this long resets the backoff counter
const STABLE_SESSION: Duration = Duration::from_secs(60);

/// Configuration for the chat client
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub channel_name: String,
    pub irc_url: String,
    /// `None` connects anonymously (read-only)
    pub credentials: Option<IrcCredentials>,
}

impl ChatConfig {
    pub fn anonymous(channel_name: &str) -> Self {
        Self {
            channel_name: normalize_channel(channel_name),
            irc_url: DEFAULT_IRC_URL.to_string(),
            credentials: None,
        }
    }
}

/// Public events from the chat client
#[derive(Debug, Clone)]
pub enum ChatClientEvent {
    /// Joined the channel
    Connected,

    /// Socket closed, with a reason
    Disconnected(String),

    /// Chat message received
    Message(ChatMessageEvent),

    /// Error occurred; the client keeps reconnecting
    Error(String),
}

/// Read-only Twitch chat client. Owns the socket task and its reconnects.
pub struct ChatClient {
    config: ChatConfig,
    handler: WebSocketHandler,
    tasks: Vec<JoinHandle<()>>,
}

impl ChatClient {
    /// Create a new chat client
    pub fn new(config: ChatConfig) -> Self {
        let credentials = config
            .credentials
            .clone()
            .unwrap_or_else(IrcCredentials::anonymous);
        let handler = WebSocketHandler::new(config.irc_url.clone(), &config.channel_name, credentials);

        Self {
            config,
            handler,
            tasks: Vec::new(),
        }
    }

    /// Start the connection in the background; events arrive on `event_tx`
    pub fn connect(&mut self, event_tx: mpsc::Sender<ChatClientEvent>) {
        log::info!("Connecting to chat for #{}", self.config.channel_name);
        let (ws_tx, mut ws_rx) = mpsc::channel::<WebSocketMessage>(100);

        // Supervisor: one session at a time, backoff between them, never gives up
        let mut handler = self.handler.clone();
        let supervisor = tokio::spawn(async move {
            let mut failures = 0;
            loop {
                let started = Instant::now();
                match handler.connect(ws_tx.clone()).await {
                    Ok(()) => log::info!("Chat session ended"),
                    Err(e) => {
                        log::error!("Chat connection failed: {}", e);
                        let _ = ws_tx.send(WebSocketMessage::Error(e.to_string())).await;
                    }
                }

                let requested = handler.state().await == ConnectionState::Reconnecting;
                failures = next_attempt(failures, started.elapsed(), requested);
                let delay = backoff_delay(failures);
                log::info!("Reconnecting to chat in {:?} (attempt {})", delay, failures);
                sleep(delay).await;
            }
        });

        // Forward socket messages as client events
        let forwarder = tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                let event = match msg {
                    WebSocketMessage::Joined => ChatClientEvent::Connected,
                    WebSocketMessage::Disconnected(reason) => ChatClientEvent::Disconnected(reason),
                    WebSocketMessage::Chat(chat) => ChatClientEvent::Message(chat),
                    WebSocketMessage::Error(e) => ChatClientEvent::Error(e),
                };
                if event_tx.send(event).await.is_err() {
                    log::debug!("Chat event receiver dropped");
                    break;
                }
            }
        });

        self.tasks = vec![supervisor, forwarder];
    }

    /// Stop all background tasks
    pub fn disconnect(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Backoff attempt number for the next session.
///
/// A stable session or a server-requested reconnect starts over at the
/// shortest delay; anything else climbs toward the cap.
fn next_attempt(failures: u32, session: Duration, requested: bool) -> u32 {
    if requested || session >= STABLE_SESSION {
        1
    } else {
        failures.saturating_add(1)
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
