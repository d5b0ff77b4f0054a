use futures_util::future::BoxFuture;
use serde::Deserialize;

use super::error::Result;
use super::provider::{get_json, ChannelKey, EmoteProvider};
use super::store::{EmoteDescriptor, ProviderKind};

pub const DEFAULT_BTTV_URL: &str = "https://api.betterttv.net";

#[derive(Debug, Deserialize)]
struct BttvEmote {
    id: String,
    code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BttvUser {
    #[serde(default)]
    channel_emotes: Vec<BttvEmote>,
    #[serde(default)]
    shared_emotes: Vec<BttvEmote>,
}

impl From<BttvEmote> for EmoteDescriptor {
    fn from(emote: BttvEmote) -> Self {
        let url = format!("https://cdn.betterttv.net/emote/{}/1x", emote.id);
        EmoteDescriptor::new(emote.id, emote.code, url)
    }
}

/// BetterTTV; channel emotes are keyed by Twitch user id
pub struct BttvEmotes {
    client: reqwest::Client,
    base_url: String,
}

impl BttvEmotes {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl EmoteProvider for BttvEmotes {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bttv
    }

    fn channel_key(&self) -> ChannelKey {
        ChannelKey::Id
    }

    fn fetch_global(&self) -> BoxFuture<'_, Result<Vec<EmoteDescriptor>>> {
        Box::pin(async move {
            let url = format!("{}/3/cached/emotes/global", self.base_url);
            let emotes: Vec<BttvEmote> = get_json(&self.client, &url).await?;
            Ok(emotes.into_iter().map(EmoteDescriptor::from).collect())
        })
    }

    fn fetch_channel<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Result<Vec<EmoteDescriptor>>> {
        Box::pin(async move {
            let url = format!(
                "{}/3/cached/users/twitch/{}",
                self.base_url,
                urlencoding::encode(channel)
            );
            let user: BttvUser = get_json(&self.client, &url).await?;
            Ok(user
                .channel_emotes
                .into_iter()
                .chain(user.shared_emotes)
                .map(EmoteDescriptor::from)
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_global_emotes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/3/cached/emotes/global")
            .with_status(200)
            .with_body(r#"[{"id":"54fa925e01e468494b85b54d","code":"OhMyGoodness","imageType":"png"}]"#)
            .create_async()
            .await;

        let emotes = BttvEmotes::new(server.url()).fetch_global().await.unwrap();
        assert_eq!(emotes.len(), 1);
        assert_eq!(emotes[0].name, "OhMyGoodness");
        assert_eq!(
            emotes[0].image_url,
            "https://cdn.betterttv.net/emote/54fa925e01e468494b85b54d/1x"
        );
    }

    #[tokio::test]
    async fn test_channel_emotes_merge_own_and_shared() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/3/cached/users/twitch/1234")
            .with_status(200)
            .with_body(
                r#"{"id":"x","bots":[],"channelEmotes":[{"id":"a","code":"own"}],"sharedEmotes":[{"id":"b","code":"shared"}]}"#,
            )
            .create_async()
            .await;

        let emotes = BttvEmotes::new(server.url()).fetch_channel("1234").await.unwrap();
        let names: Vec<_> = emotes.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["own", "shared"]);
    }

    #[tokio::test]
    async fn test_channel_without_emote_lists() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/3/cached/users/twitch/1234")
            .with_status(200)
            .with_body(r#"{"id":"x"}"#)
            .create_async()
            .await;

        let emotes = BttvEmotes::new(server.url()).fetch_channel("1234").await.unwrap();
        assert!(emotes.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/3/cached/users/twitch/999")
            .with_status(404)
            .create_async()
            .await;

        let result = BttvEmotes::new(server.url()).fetch_channel("999").await;
        assert!(matches!(
            result,
            Err(super::super::error::ProviderError::Status { status: 404, .. })
        ));
    }
}
