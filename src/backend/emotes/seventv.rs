use futures_util::future::BoxFuture;
use serde::Deserialize;

use super::error::Result;
use super::provider::{get_json, ChannelKey, EmoteProvider};
use super::store::{EmoteDescriptor, ProviderKind};

pub const DEFAULT_SEVENTV_URL: &str = "https://7tv.io";

#[derive(Debug, Deserialize)]
struct SevenTvEmote {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SevenTvEmoteSet {
    #[serde(default)]
    emotes: Vec<SevenTvEmote>,
}

#[derive(Debug, Deserialize)]
struct SevenTvUser {
    emote_set: Option<SevenTvEmoteSet>,
}

impl From<SevenTvEmote> for EmoteDescriptor {
    fn from(emote: SevenTvEmote) -> Self {
        let url = format!("https://cdn.7tv.app/emote/{}/1x.webp", emote.id);
        EmoteDescriptor::new(emote.id, emote.name, url)
    }
}

/// 7TV; channel emotes are looked up by login
pub struct SevenTvEmotes {
    client: reqwest::Client,
    base_url: String,
}

impl SevenTvEmotes {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl EmoteProvider for SevenTvEmotes {
    fn kind(&self) -> ProviderKind {
        ProviderKind::SevenTv
    }

    fn channel_key(&self) -> ChannelKey {
        ChannelKey::Login
    }

    fn fetch_global(&self) -> BoxFuture<'_, Result<Vec<EmoteDescriptor>>> {
        Box::pin(async move {
            let url = format!("{}/v3/emote-sets/global", self.base_url);
            let set: SevenTvEmoteSet = get_json(&self.client, &url).await?;
            Ok(set.emotes.into_iter().map(EmoteDescriptor::from).collect())
        })
    }

    fn fetch_channel<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Result<Vec<EmoteDescriptor>>> {
        Box::pin(async move {
            let url = format!(
                "{}/v3/users/twitch/{}",
                self.base_url,
                urlencoding::encode(channel)
            );
            let user: SevenTvUser = get_json(&self.client, &url).await?;
            Ok(user
                .emote_set
                .map(|set| set.emotes.into_iter().map(EmoteDescriptor::from).collect())
                .unwrap_or_default())
        })
    }
}
