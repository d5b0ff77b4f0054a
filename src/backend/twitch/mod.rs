//! Twitch chat integration
//!
//! Reads a channel's chat over IRC-over-WebSocket (anonymously by default) and
//! talks to the Helix API for identity and emote lookups:
//! - IRCv3 line parsing with tags (roles, colour, native emote placements)
//! - Background reconnection with exponential backoff
//! - Helix `users` and `chat/emotes` endpoints
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use chatlayer::backend::twitch::{ChatClient, ChatClientEvent, ChatConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let mut client = ChatClient::new(ChatConfig::anonymous("your_channel"));
//!     client.connect(tx);
//!
//!     while let Some(event) = rx.recv().await {
//!         if let ChatClientEvent::Message(chat) = event {
//!             println!("{}: {}", chat.tags.display_name, chat.text);
//!         }
//!     }
//! }
//! ```

mod api;
mod client;
mod error;
mod irc;
mod messages;
mod websocket;

// Re-export public types
pub use api::{HelixClient, HelixEmote, UserData, DEFAULT_HELIX_URL, HTTP_TIMEOUT};
pub use client::{ChatClient, ChatClientEvent, ChatConfig};
pub use error::{Result, TwitchError};
pub use irc::IrcMessage;
pub use messages::{parse_emotes_tag, ChatMessageEvent, ChatTags, EmotePlacements, EmoteSpan};
pub use websocket::{normalize_channel, IrcCredentials, DEFAULT_IRC_URL};
