use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Where an emote comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Twitch itself
    Twitch,
    /// BetterTTV
    Bttv,
    /// FrankerFaceZ
    Ffz,
    /// 7TV
    SevenTv,
}

impl ProviderKind {
    /// Lookup order for word matching; the first hit wins
    pub const PRIORITY: [ProviderKind; 4] = [
        ProviderKind::Twitch,
        ProviderKind::Bttv,
        ProviderKind::Ffz,
        ProviderKind::SevenTv,
    ];

    /// Short label shown in emote tooltips
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Twitch => "twitch",
            ProviderKind::Bttv => "bttv",
            ProviderKind::Ffz => "ffz",
            ProviderKind::SevenTv => "7tv",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Twitch => "Twitch",
            ProviderKind::Bttv => "BetterTTV",
            ProviderKind::Ffz => "FrankerFaceZ",
            ProviderKind::SevenTv => "7TV",
        };
        f.write_str(name)
    }
}

/// One emote as loaded from a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteDescriptor {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

impl EmoteDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: image_url.into(),
        }
    }
}

/// Name -> emote index, one map per provider.
///
/// Filled during startup, then shared read-only behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct EmoteStore {
    providers: HashMap<ProviderKind, HashMap<String, EmoteDescriptor>>,
}

impl EmoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert emotes for a provider. A name already present is overwritten.
    pub fn extend<I>(&mut self, provider: ProviderKind, emotes: I) -> usize
    where
        I: IntoIterator<Item = EmoteDescriptor>,
    {
        let map = self.providers.entry(provider).or_default();
        let mut count = 0;
        for emote in emotes {
            map.insert(emote.name.clone(), emote);
            count += 1;
        }
        count
    }

    /// Exact lookup in one provider
    pub fn get(&self, provider: ProviderKind, name: &str) -> Option<&EmoteDescriptor> {
        self.providers.get(&provider).and_then(|map| map.get(name))
    }

    /// First match across providers in priority order
    pub fn find(&self, name: &str) -> Option<(ProviderKind, &EmoteDescriptor)> {
        ProviderKind::PRIORITY
            .iter()
            .find_map(|&provider| self.get(provider, name).map(|emote| (provider, emote)))
    }

    /// Number of emotes loaded for one provider
    pub fn provider_len(&self, provider: ProviderKind) -> usize {
        self.providers.get(&provider).map_or(0, HashMap::len)
    }

    /// Total emotes across all providers
    pub fn len(&self) -> usize {
        self.providers.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_insert_overwrites_same_name() {
        let mut store = EmoteStore::new();
        store.extend(ProviderKind::Bttv, [EmoteDescriptor::new("1", "catJAM", "a.png")]);
        store.extend(ProviderKind::Bttv, [EmoteDescriptor::new("2", "catJAM", "b.png")]);

        assert_eq!(store.provider_len(ProviderKind::Bttv), 1);
        assert_eq!(store.get(ProviderKind::Bttv, "catJAM").unwrap().image_url, "b.png");
    }

    #[test]
    fn test_providers_do_not_share_names() {
        let mut store = EmoteStore::new();
        store.extend(ProviderKind::Ffz, [EmoteDescriptor::new("1", "LUL", "ffz.png")]);
        store.extend(ProviderKind::SevenTv, [EmoteDescriptor::new("2", "LUL", "7tv.png")]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(ProviderKind::SevenTv, "LUL").unwrap().image_url, "7tv.png");
    }

    #[test]
    fn test_find_uses_priority_order() {
        let mut store = EmoteStore::new();
        store.extend(ProviderKind::SevenTv, [EmoteDescriptor::new("3", "pog", "7tv.png")]);
        store.extend(ProviderKind::Ffz, [EmoteDescriptor::new("2", "pog", "ffz.png")]);
        store.extend(ProviderKind::Bttv, [EmoteDescriptor::new("1", "pog", "bttv.png")]);

        let (provider, emote) = store.find("pog").unwrap();
        assert_eq!(provider, ProviderKind::Bttv);
        assert_eq!(emote.image_url, "bttv.png");
        assert!(store.find("Pog").is_none());
    }

    #[test]
    fn test_empty_store() {
        let store = EmoteStore::new();
        assert!(store.is_empty());
        assert_eq!(store.provider_len(ProviderKind::Twitch), 0);
        assert!(store.find("Kappa").is_none());
    }
}
