use futures_util::future::BoxFuture;

use super::error::Result;
use super::provider::{ChannelKey, EmoteProvider};
use super::store::{EmoteDescriptor, ProviderKind};
use crate::backend::twitch::{HelixClient, HelixEmote};

/// Image URL for a native emote id
pub fn native_emote_url(id: &str) -> String {
    format!("https://static-cdn.jtvnw.net/emoticons/v2/{}/default/dark/1.0", id)
}

/// Native Twitch emotes via Helix
pub struct TwitchEmotes {
    helix: HelixClient,
}

impl TwitchEmotes {
    pub fn new(helix: HelixClient) -> Self {
        Self { helix }
    }
}

fn to_descriptors(emotes: Vec<HelixEmote>) -> Vec<EmoteDescriptor> {
    emotes
        .into_iter()
        .map(|emote| {
            let url = native_emote_url(&emote.id);
            EmoteDescriptor::new(emote.id, emote.name, url)
        })
        .collect()
}

impl EmoteProvider for TwitchEmotes {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Twitch
    }

    fn channel_key(&self) -> ChannelKey {
        ChannelKey::Id
    }

    fn fetch_global(&self) -> BoxFuture<'_, Result<Vec<EmoteDescriptor>>> {
        Box::pin(async move { Ok(to_descriptors(self.helix.get_global_emotes().await?)) })
    }

    fn fetch_channel<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Result<Vec<EmoteDescriptor>>> {
        Box::pin(async move { Ok(to_descriptors(self.helix.get_channel_emotes(channel).await?)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_global_and_channel_emotes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/chat/emotes/global")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"25","name":"Kappa","format":["static"]}],"template":"x"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/chat/emotes?broadcaster_id=1234")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"emotesv2_abc","name":"chanHype"}]}"#)
            .create_async()
            .await;

        let provider = TwitchEmotes::new(HelixClient::new(server.url(), "cid", "tok"));

        let global = provider.fetch_global().await.unwrap();
        assert_eq!(global, vec![EmoteDescriptor::new(
            "25",
            "Kappa",
            "https://static-cdn.jtvnw.net/emoticons/v2/25/default/dark/1.0"
        )]);

        let channel = provider.fetch_channel("1234").await.unwrap();
        assert_eq!(channel[0].name, "chanHype");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/chat/emotes/global")
            .with_status(200)
            .with_body(r#"{"emotes":[]}"#)
            .create_async()
            .await;

        let provider = TwitchEmotes::new(HelixClient::new(server.url(), "cid", "tok"));
        assert!(provider.fetch_global().await.is_err());
    }
}
