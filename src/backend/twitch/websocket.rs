use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::error::{Result, TwitchError};
use super::irc::IrcMessage;
use super::messages::ChatMessageEvent;

pub const DEFAULT_IRC_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Twitch pings roughly every five minutes; silence past this ends the session
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(6 * 60);

/// WebSocket connection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Messages from the WebSocket handler
#[derive(Debug, Clone)]
pub enum WebSocketMessage {
    /// Server accepted the login and the channel was joined
    Joined,
    Disconnected(String),
    Chat(ChatMessageEvent),
    Error(String),
}

/// What to do after handling one IRC line
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineAction {
    Nothing,
    Reply(String),
    /// Server asked us to reconnect
    Reconnect,
}

/// Login used on the IRC socket
#[derive(Debug, Clone)]
pub struct IrcCredentials {
    pub nick: String,
    /// `None` logs in anonymously
    pub token: Option<String>,
}

impl IrcCredentials {
    /// Read-only anonymous login (`justinfanNNNNN`)
    pub fn anonymous() -> Self {
        let suffix: u32 = rand::random::<u32>() % 90_000 + 10_000;
        Self {
            nick: format!("justinfan{}", suffix),
            token: None,
        }
    }
}

/// IRC-over-WebSocket connection handler for Twitch chat
#[derive(Clone)]
pub struct WebSocketHandler {
    url: String,
    channel: String,
    credentials: IrcCredentials,
    idle_timeout: Duration,
    state: Arc<RwLock<ConnectionState>>,
}

impl WebSocketHandler {
    pub fn new(url: impl Into<String>, channel: &str, credentials: IrcCredentials) -> Self {
        Self {
            url: url.into(),
            channel: normalize_channel(channel),
            credentials,
            idle_timeout: IDLE_TIMEOUT,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Lines sent right after the socket opens
    fn login_lines(&self) -> Vec<String> {
        let pass = match &self.credentials.token {
            Some(token) => format!("PASS oauth:{}", token.trim_start_matches("oauth:")),
            None => "PASS SCHMOOPIIE".to_string(),
        };
        vec![
            "CAP REQ :twitch.tv/tags twitch.tv/commands".to_string(),
            pass,
            format!("NICK {}", self.credentials.nick),
            format!("JOIN #{}", self.channel),
        ]
    }

    async fn set_state(&self, state: ConnectionState) {
        *self.state.write().await = state;
    }

    /// Open the socket, log in, and pump messages until it closes.
    ///
    /// Returns an error when the handshake fails or nothing arrives for the
    /// idle timeout, so the caller can back off and reconnect.
    pub async fn connect(&mut self, tx: mpsc::Sender<WebSocketMessage>) -> Result<()> {
        self.set_state(ConnectionState::Connecting).await;

        let (ws_stream, _) = match timeout(self.idle_timeout, connect_async(self.url.as_str())).await {
            Ok(connected) => connected?,
            Err(_) => {
                self.set_state(ConnectionState::Disconnected).await;
                return Err(TwitchError::WebSocketError(format!(
                    "handshake timed out after {:?}",
                    self.idle_timeout
                )));
            }
        };
        let (mut write, mut read) = ws_stream.split();

        for line in self.login_lines() {
            write.send(Message::text(line)).await?;
        }

        loop {
            let message = match timeout(self.idle_timeout, read.next()).await {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(_) => {
                    log::warn!("No chat traffic for {:?}, dropping the session", self.idle_timeout);
                    self.set_state(ConnectionState::Disconnected).await;
                    let _ = tx
                        .send(WebSocketMessage::Disconnected("idle timeout".to_string()))
                        .await;
                    return Err(TwitchError::WebSocketError(format!(
                        "no traffic for {:?}",
                        self.idle_timeout
                    )));
                }
            };

            match message {
                Ok(Message::Text(text)) => {
                    for line in text.as_str().split("\r\n").filter(|l| !l.is_empty()) {
                        match self.handle_line(line, &tx).await {
                            Ok(LineAction::Reply(reply)) => {
                                if let Err(e) = write.send(Message::text(reply)).await {
                                    log::error!("Failed to send IRC reply: {}", e);
                                }
                            }
                            Ok(LineAction::Reconnect) => {
                                let _ = write.send(Message::Close(None)).await;
                                let _ = tx
                                    .send(WebSocketMessage::Disconnected(
                                        "server requested reconnect".to_string(),
                                    ))
                                    .await;
                                return Ok(());
                            }
                            Ok(LineAction::Nothing) => {}
                            Err(e) => {
                                log::debug!("Ignoring IRC line: {}", e);
                            }
                        }
                    }
                }
                Ok(Message::Close(frame)) => {
                    let code: u16 = frame.as_ref().map(|f| f.code.into()).unwrap_or(1000);
                    let reason = frame
                        .as_ref()
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "Unknown".to_string());

                    log::warn!("Chat socket closed: code={}, reason={}", code, reason);

                    self.set_state(ConnectionState::Disconnected).await;
                    let _ = tx
                        .send(WebSocketMessage::Disconnected(
                            TwitchError::ConnectionClosed(code, reason).to_string(),
                        ))
                        .await;
                    return Ok(());
                }
                Ok(Message::Ping(payload)) => {
                    if let Err(e) = write.send(Message::Pong(payload)).await {
                        log::error!("Failed to send pong: {}", e);
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("Chat socket error: {}", e);
                    self.set_state(ConnectionState::Disconnected).await;
                    let _ = tx.send(WebSocketMessage::Error(e.to_string())).await;
                    break;
                }
            }
        }

        self.set_state(ConnectionState::Disconnected).await;
        let _ = tx
            .send(WebSocketMessage::Disconnected("stream ended".to_string()))
            .await;
        Ok(())
    }

    /// Handle one IRC line
    async fn handle_line(
        &self,
        line: &str,
        tx: &mpsc::Sender<WebSocketMessage>,
    ) -> Result<LineAction> {
        let message = IrcMessage::parse(line)?;
        let command = message.command.clone();
        log::trace!("IRC <- {}", command);

        match command.as_str() {
            "PING" => {
                let token = message.params.first().map(String::as_str).unwrap_or("tmi.twitch.tv");
                return Ok(LineAction::Reply(format!("PONG :{}", token)));
            }
            "JOIN" => {
                if message
                    .nick()
                    .is_some_and(|nick| nick.eq_ignore_ascii_case(&self.credentials.nick))
                {
                    self.set_state(ConnectionState::Connected).await;
                    let _ = tx.send(WebSocketMessage::Joined).await;
                }
            }
            "RECONNECT" => {
                log::warn!("Server requested reconnect");
                self.set_state(ConnectionState::Reconnecting).await;
                return Ok(LineAction::Reconnect);
            }
            "NOTICE" => {
                let text = message.params.last().cloned().unwrap_or_default();
                log::warn!("Chat notice: {}", text);
                if text.contains("Login authentication failed") {
                    let _ = tx.send(WebSocketMessage::Error(text)).await;
                }
            }
            "PRIVMSG" => {
                if let Some(chat) = message.into_chat_message(&self.credentials.nick) {
                    let _ = tx.send(WebSocketMessage::Chat(chat)).await;
                }
            }
            _ => {}
        }

        Ok(LineAction::Nothing)
    }

    /// Get the current connection state
    pub async fn state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }
}

/// Strip a leading `#` and lower-case a channel name
pub fn normalize_channel(channel: &str) -> String {
    channel.trim().trim_start_matches('#').to_lowercase()
}

/// Delay before reconnect attempt `attempt` (1-based): 1s doubling, capped at 64s
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1) * 2_u32.pow(attempt.saturating_sub(1).min(6))
}
