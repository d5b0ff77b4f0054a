use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;

use crate::backend::twitch::HTTP_TIMEOUT;

use super::error::{ProviderError, Result};
use super::store::{EmoteDescriptor, ProviderKind};

/// What a provider needs to identify a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKey {
    /// Lower-case login name
    Login,
    /// Numeric Twitch user id
    Id,
}

/// A source of emotes. Each implementation adapts one provider's API shape.
pub trait EmoteProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn channel_key(&self) -> ChannelKey;

    /// Emotes available in every channel
    fn fetch_global(&self) -> BoxFuture<'_, Result<Vec<EmoteDescriptor>>>;

    /// Emotes scoped to one channel; `channel` is a login or an id per `channel_key`
    fn fetch_channel<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Result<Vec<EmoteDescriptor>>>;
}

/// Unauthenticated GET returning JSON, shared by the third-party providers
pub(crate) async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T> {
    let response = client.get(url).timeout(HTTP_TIMEOUT).send().await?;

    if !response.status().is_success() {
        return Err(ProviderError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}
