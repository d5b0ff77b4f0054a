use thiserror::Error;

/// Errors that can occur while talking to Twitch (chat socket or Helix)
#[derive(Debug, Error)]
pub enum TwitchError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Malformed IRC line
    #[error("IRC parse error: {0}")]
    IrcError(String),

    /// User lookup returned no rows
    #[error("User '{0}' not found")]
    UserNotFound(String),

    /// Connection closed unexpectedly
    #[error("Connection closed: code={0}, reason={1}")]
    ConnectionClosed(u16, String),
}

impl From<serde_json::Error> for TwitchError {
    fn from(err: serde_json::Error) -> Self {
        TwitchError::JsonError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TwitchError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        TwitchError::WebSocketError(err.to_string())
    }
}

impl From<reqwest::Error> for TwitchError {
    fn from(err: reqwest::Error) -> Self {
        TwitchError::HttpError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TwitchError>;
