//! Third-party and native emote sets.
//!
//! Each provider adapter implements [`EmoteProvider`]; [`initialize_emotes`]
//! loads all of them concurrently into an [`EmoteStore`] that is then shared
//! read-only with the renderer.

mod bttv;
mod error;
mod ffz;
mod loader;
mod provider;
mod seventv;
mod store;
mod twitch;

pub use bttv::{BttvEmotes, DEFAULT_BTTV_URL};
pub use error::{ProviderError, Result};
pub use ffz::{FfzEmotes, DEFAULT_FFZ_URL};
pub use loader::{initialize_emotes, load_emotes, resolve_channel_id};
pub use provider::{ChannelKey, EmoteProvider};
pub use seventv::{SevenTvEmotes, DEFAULT_SEVENTV_URL};
pub use store::{EmoteDescriptor, EmoteStore, ProviderKind};
pub use twitch::{native_emote_url, TwitchEmotes};
