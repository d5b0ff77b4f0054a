use futures_util::future::BoxFuture;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::Result;
use super::provider::{get_json, ChannelKey, EmoteProvider};
use super::store::{EmoteDescriptor, ProviderKind};

pub const DEFAULT_FFZ_URL: &str = "https://api.frankerfacez.com";

#[derive(Debug, Deserialize)]
struct FfzEmote {
    id: u64,
    name: String,
    #[serde(default)]
    urls: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FfzSet {
    #[serde(default)]
    emoticons: Vec<FfzEmote>,
}

/// Both `/set/global` and `/room/{login}` carry emotes in `sets`
#[derive(Debug, Deserialize)]
struct FfzSets {
    sets: BTreeMap<String, FfzSet>,
}

impl FfzSets {
    fn into_descriptors(self) -> Vec<EmoteDescriptor> {
        self.sets
            .into_values()
            .flat_map(|set| set.emoticons)
            .filter_map(|emote| {
                // Prefer the 1x image, else whatever scale exists
                let url = emote
                    .urls
                    .get("1")
                    .or_else(|| emote.urls.values().next())?;
                let url = absolute_url(url);
                Some(EmoteDescriptor::new(emote.id.to_string(), emote.name, url))
            })
            .collect()
    }
}

/// FFZ hands out protocol-relative URLs (`//cdn.frankerfacez.com/...`)
fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// FrankerFaceZ; channel emotes are keyed by login
pub struct FfzEmotes {
    client: reqwest::Client,
    base_url: String,
}

impl FfzEmotes {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl EmoteProvider for FfzEmotes {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ffz
    }

    fn channel_key(&self) -> ChannelKey {
        ChannelKey::Login
    }

    fn fetch_global(&self) -> BoxFuture<'_, Result<Vec<EmoteDescriptor>>> {
        Box::pin(async move {
            let url = format!("{}/v1/set/global", self.base_url);
            let sets: FfzSets = get_json(&self.client, &url).await?;
            Ok(sets.into_descriptors())
        })
    }

    fn fetch_channel<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Result<Vec<EmoteDescriptor>>> {
        Box::pin(async move {
            let url = format!("{}/v1/room/{}", self.base_url, urlencoding::encode(channel));
            let sets: FfzSets = get_json(&self.client, &url).await?;
            Ok(sets.into_descriptors())
        })
    }
}
