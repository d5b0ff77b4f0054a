use futures_util::future::{join_all, BoxFuture};
use std::fmt;

use super::error::Result;
use super::provider::{ChannelKey, EmoteProvider};
use super::store::{EmoteDescriptor, EmoteStore, ProviderKind};
use crate::backend::twitch::HelixClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadScope {
    Global,
    Channel,
}

impl fmt::Display for LoadScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadScope::Global => f.write_str("global"),
            LoadScope::Channel => f.write_str("channel"),
        }
    }
}

type LoadOutcome = (ProviderKind, LoadScope, Result<Vec<EmoteDescriptor>>);

/// Resolve a channel login to its numeric id. `None` on any failure.
pub async fn resolve_channel_id(helix: &HelixClient, login: &str) -> Option<String> {
    match helix.get_user_by_login(login).await {
        Ok(user) => {
            log::info!("Resolved channel {} to id {}", login, user.id);
            Some(user.id)
        }
        Err(e) => {
            log::warn!("Could not resolve channel id for {}: {}", login, e);
            None
        }
    }
}

/// Run every provider's global and channel load concurrently and collect
/// the results into a fresh store.
///
/// A failed load is logged and contributes nothing. Channel loads for
/// providers keyed by id are skipped when `channel_id` is `None`. Results are
/// applied global-first per provider, so channel emotes shadow global ones.
pub async fn load_emotes(
    providers: &[Box<dyn EmoteProvider>],
    login: &str,
    channel_id: Option<&str>,
) -> EmoteStore {
    let mut jobs: Vec<BoxFuture<'_, LoadOutcome>> = Vec::new();

    for provider in providers {
        let kind = provider.kind();
        jobs.push(Box::pin(async move {
            (kind, LoadScope::Global, provider.fetch_global().await)
        }));

        let channel = match provider.channel_key() {
            ChannelKey::Login => Some(login),
            ChannelKey::Id => channel_id,
        };
        match channel {
            Some(channel) => jobs.push(Box::pin(async move {
                (kind, LoadScope::Channel, provider.fetch_channel(channel).await)
            })),
            None => log::warn!("Skipping {} channel emotes: channel id unknown", kind),
        }
    }

    let mut store = EmoteStore::new();
    for (kind, scope, result) in join_all(jobs).await {
        match result {
            Ok(emotes) => {
                let count = store.extend(kind, emotes);
                log::info!("Loaded {} {} emotes from {}", count, scope, kind);
            }
            Err(e) => log::warn!("Failed to load {} emotes from {}: {}", scope, kind, e),
        }
    }

    log::info!("Total emotes loaded: {}", store.len());
    store
}

/// Startup sequence: resolve the channel id once, then load everything
pub async fn initialize_emotes(
    helix: &HelixClient,
    providers: &[Box<dyn EmoteProvider>],
    login: &str,
) -> EmoteStore {
    log::info!("Loading emotes for #{}...", login);
    let channel_id = if helix.has_credentials() {
        resolve_channel_id(helix, login).await
    } else {
        log::warn!("No Twitch credentials configured; channel id lookups disabled");
        None
    };
    load_emotes(providers, login, channel_id.as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::emotes::error::ProviderError;
    use std::sync::{Arc, Mutex};

    /// Scripted provider that records which loads ran
    struct FakeProvider {
        kind: ProviderKind,
        key: ChannelKey,
        global: Vec<EmoteDescriptor>,
        channel: Vec<EmoteDescriptor>,
        fail_global: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeProvider {
        fn new(kind: ProviderKind, key: ChannelKey, calls: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                kind,
                key,
                global: vec![EmoteDescriptor::new("g", format!("{}Global", kind.label()), "g.png")],
                channel: vec![EmoteDescriptor::new("c", format!("{}Channel", kind.label()), "c.png")],
                fail_global: false,
                calls: calls.clone(),
            }
        }
    }

    impl EmoteProvider for FakeProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn channel_key(&self) -> ChannelKey {
            self.key
        }

        fn fetch_global(&self) -> BoxFuture<'_, Result<Vec<EmoteDescriptor>>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(format!("{}:global", self.kind.label()));
                if self.fail_global {
                    return Err(ProviderError::Status {
                        status: 500,
                        url: "http://fake".to_string(),
                    });
                }
                Ok(self.global.clone())
            })
        }

        fn fetch_channel<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Result<Vec<EmoteDescriptor>>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .unwrap()
                    .push(format!("{}:channel:{}", self.kind.label(), channel));
                Ok(self.channel.clone())
            })
        }
    }

    fn all_providers(calls: &Arc<Mutex<Vec<String>>>) -> Vec<Box<dyn EmoteProvider>> {
        vec![
            Box::new(FakeProvider::new(ProviderKind::Twitch, ChannelKey::Id, calls)),
            Box::new(FakeProvider::new(ProviderKind::Bttv, ChannelKey::Id, calls)),
            Box::new(FakeProvider::new(ProviderKind::Ffz, ChannelKey::Login, calls)),
            Box::new(FakeProvider::new(ProviderKind::SevenTv, ChannelKey::Login, calls)),
        ]
    }

    #[tokio::test]
    async fn test_loads_global_and_channel_for_every_provider() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let store = load_emotes(&all_providers(&calls), "somechannel", Some("1234")).await;

        assert_eq!(store.len(), 8);
        let calls = calls.lock().unwrap();
        assert!(calls.contains(&"twitch:channel:1234".to_string()));
        assert!(calls.contains(&"bttv:channel:1234".to_string()));
        assert!(calls.contains(&"ffz:channel:somechannel".to_string()));
        assert!(calls.contains(&"7tv:channel:somechannel".to_string()));
    }

    #[tokio::test]
    async fn test_unresolved_id_skips_id_keyed_channel_loads() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let store = load_emotes(&all_providers(&calls), "somechannel", None).await;

        for kind in ProviderKind::PRIORITY {
            let global = format!("{}Global", kind.label());
            assert!(store.get(kind, &global).is_some(), "missing {}", global);
        }
        assert!(store.get(ProviderKind::Twitch, "twitchChannel").is_none());
        assert!(store.get(ProviderKind::Bttv, "bttvChannel").is_none());
        assert!(store.get(ProviderKind::Ffz, "ffzChannel").is_some());
        assert!(store.get(ProviderKind::SevenTv, "7tvChannel").is_some());

        let calls = calls.lock().unwrap();
        assert!(!calls.iter().any(|c| c.starts_with("twitch:channel")));
        assert!(!calls.iter().any(|c| c.starts_with("bttv:channel")));
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut failing = FakeProvider::new(ProviderKind::Ffz, ChannelKey::Login, &calls);
        failing.fail_global = true;
        let providers: Vec<Box<dyn EmoteProvider>> = vec![
            Box::new(FakeProvider::new(ProviderKind::Bttv, ChannelKey::Id, &calls)),
            Box::new(failing),
        ];

        let store = load_emotes(&providers, "somechannel", Some("1")).await;
        assert_eq!(store.provider_len(ProviderKind::Bttv), 2);
        // Channel load still ran for the provider whose global load failed
        assert_eq!(store.provider_len(ProviderKind::Ffz), 1);
        assert!(store.get(ProviderKind::Ffz, "ffzGlobal").is_none());
    }

    #[tokio::test]
    async fn test_channel_emotes_shadow_global() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut provider = FakeProvider::new(ProviderKind::SevenTv, ChannelKey::Login, &calls);
        provider.global = vec![EmoteDescriptor::new("1", "EZ", "global.webp")];
        provider.channel = vec![EmoteDescriptor::new("2", "EZ", "channel.webp")];
        let providers: Vec<Box<dyn EmoteProvider>> = vec![Box::new(provider)];

        let store = load_emotes(&providers, "somechannel", None).await;
        assert_eq!(store.get(ProviderKind::SevenTv, "EZ").unwrap().image_url, "channel.webp");
    }

    #[tokio::test]
    async fn test_resolve_channel_id_failure_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users?login=somechannel")
            .with_status(500)
            .create_async()
            .await;

        let helix = HelixClient::new(server.url(), "cid", "tok");
        assert_eq!(resolve_channel_id(&helix, "somechannel").await, None);
    }

    #[tokio::test]
    async fn test_initialize_without_credentials_skips_lookup() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let helix = HelixClient::new("http://127.0.0.1:9", "", "");
        let store = initialize_emotes(&helix, &all_providers(&calls), "somechannel").await;

        assert_eq!(store.len(), 6);
    }
}
