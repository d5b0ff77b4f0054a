use chrono::{DateTime, Local};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::markup::render_body;
use crate::backend::emotes::EmoteStore;
use crate::backend::twitch::{ChatMessageEvent, ChatTags};

/// Colours for chatters who never picked one
pub const PALETTE: [&str; 12] = [
    "#ff6b6b", "#4ecdc4", "#45b7d1", "#f9ca24", "#f0932b", "#eb4d4b", "#6c5ce7", "#a29bfe",
    "#fd79a8", "#e17055", "#00b894", "#0984e3",
];

/// Chat roles, in badge priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Broadcaster,
    Moderator,
    Subscriber,
    Vip,
}

impl Role {
    pub fn glyph(&self) -> &'static str {
        match self {
            Role::Broadcaster => "👑",
            Role::Moderator => "🔨",
            Role::Subscriber => "⭐",
            Role::Vip => "💎",
        }
    }

    /// Roles carried by a set of tags, highest priority first
    pub fn from_tags(tags: &ChatTags) -> Vec<Role> {
        [
            (tags.broadcaster, Role::Broadcaster),
            (tags.moderator, Role::Moderator),
            (tags.subscriber, Role::Subscriber),
            (tags.vip, Role::Vip),
        ]
        .into_iter()
        .filter_map(|(has, role)| has.then_some(role))
        .collect()
    }
}

/// Entrance animation variants; serialized as the overlay's CSS class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntranceAnimation {
    #[serde(rename = "slideInRight")]
    SlideInRight,
    #[serde(rename = "bounce-in")]
    BounceIn,
    #[serde(rename = "fade-in")]
    FadeIn,
    #[serde(rename = "zoom-in")]
    ZoomIn,
}

impl EntranceAnimation {
    pub const ALL: [EntranceAnimation; 4] = [
        EntranceAnimation::SlideInRight,
        EntranceAnimation::BounceIn,
        EntranceAnimation::FadeIn,
        EntranceAnimation::ZoomIn,
    ];
}

/// How chatters without a colour tag get one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// New random palette colour per message
    #[default]
    Random,
    /// Same palette colour for the same login every time
    Hashed,
}

/// Everything the overlay needs to draw one chat line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub id: u64,
    pub username: String,
    pub login: String,
    pub avatar: String,
    pub roles: Vec<Role>,
    pub badge: Option<String>,
    pub color: String,
    pub timestamp: String,
    pub body: String,
    pub highlighted: bool,
    pub entrance: Option<EntranceAnimation>,
}

/// Render settings
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub color_mode: ColorMode,
    pub time_format: String,
    /// Every n-th message gets an entrance animation; 0 disables
    pub animation_interval: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Random,
            time_format: "%H:%M".to_string(),
            animation_interval: 5,
        }
    }
}

/// Turns chat events into [`RenderedMessage`]s using a frozen emote store
pub struct MessageRenderer {
    store: Arc<EmoteStore>,
    options: RenderOptions,
    count: AtomicU64,
}

impl MessageRenderer {
    pub fn new(store: Arc<EmoteStore>, options: RenderOptions) -> Self {
        Self {
            store,
            options,
            count: AtomicU64::new(0),
        }
    }

    pub fn render(&self, event: &ChatMessageEvent, avatar: String) -> RenderedMessage {
        self.render_at(event, avatar, Local::now())
    }

    pub fn render_at(&self, event: &ChatMessageEvent, avatar: String, now: DateTime<Local>) -> RenderedMessage {
        let id = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        let roles = Role::from_tags(&event.tags);
        let badge = roles.first().map(|role| role.glyph().to_string());
        let color = self.color_for(&event.login, event.tags.color.as_deref());
        let body = render_body(&event.text, event.tags.emotes.as_ref(), &self.store);

        RenderedMessage {
            id,
            username: event.tags.display_name.clone(),
            login: event.login.clone(),
            avatar,
            roles,
            badge,
            color,
            timestamp: now.format(&self.options.time_format).to_string(),
            body,
            highlighted: is_highlighted(&event.text),
            entrance: self.entrance_for(id),
        }
    }

    fn color_for(&self, login: &str, color: Option<&str>) -> String {
        if let Some(color) = color.filter(|c| !c.is_empty()) {
            return color.to_string();
        }
        match self.options.color_mode {
            ColorMode::Random => PALETTE
                .choose(&mut rand::thread_rng())
                .unwrap_or(&PALETTE[0])
                .to_string(),
            ColorMode::Hashed => PALETTE[(stable_hash(login) % PALETTE.len() as u64) as usize].to_string(),
        }
    }

    fn entrance_for(&self, id: u64) -> Option<EntranceAnimation> {
        let interval = self.options.animation_interval;
        if interval == 0 || id % interval != 0 {
            return None;
        }
        EntranceAnimation::ALL.choose(&mut rand::thread_rng()).copied()
    }
}

/// Loud messages: any `!`, or nothing that upper-casing would change
pub fn is_highlighted(text: &str) -> bool {
    text.contains('!') || text == text.to_uppercase()
}

/// FNV-1a, stable across runs
fn stable_hash(value: &str) -> u64 {
    value
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::emotes::{EmoteDescriptor, ProviderKind};
    use chrono::TimeZone;

    fn event(text: &str, tags: ChatTags) -> ChatMessageEvent {
        ChatMessageEvent {
            channel: "#chan".to_string(),
            login: "alice".to_string(),
            tags,
            text: text.to_string(),
            is_self: false,
        }
    }

    fn renderer(options: RenderOptions) -> MessageRenderer {
        let mut store = EmoteStore::new();
        store.extend(ProviderKind::Bttv, [EmoteDescriptor::new("a", "gg", "imgA.png")]);
        MessageRenderer::new(Arc::new(store), options)
    }

    #[test]
    fn test_render_fields() {
        let tags = ChatTags {
            display_name: "Alice".to_string(),
            color: Some("#123456".to_string()),
            moderator: true,
            subscriber: true,
            ..Default::default()
        };
        let now = Local.with_ymd_and_hms(2024, 5, 1, 9, 7, 0).unwrap();
        let msg = renderer(RenderOptions::default()).render_at(&event("gg wp", tags), "a.png".to_string(), now);

        assert_eq!(msg.id, 1);
        assert_eq!(msg.username, "Alice");
        assert_eq!(msg.login, "alice");
        assert_eq!(msg.roles, vec![Role::Moderator, Role::Subscriber]);
        assert_eq!(msg.badge.as_deref(), Some("🔨"));
        assert_eq!(msg.color, "#123456");
        assert_eq!(msg.timestamp, "09:07");
        assert!(msg.body.starts_with(r#"<img src="imgA.png""#));
        assert!(msg.body.ends_with(" wp"));
        assert!(!msg.highlighted);
        assert_eq!(msg.entrance, None);
    }

    #[test]
    fn test_badge_priority() {
        let tags = ChatTags {
            broadcaster: true,
            vip: true,
            subscriber: true,
            moderator: true,
            ..Default::default()
        };
        let roles = Role::from_tags(&tags);
        assert_eq!(roles[0], Role::Broadcaster);
        assert_eq!(roles.len(), 4);

        let vip_only = ChatTags { vip: true, ..Default::default() };
        assert_eq!(Role::from_tags(&vip_only), vec![Role::Vip]);
        assert!(Role::from_tags(&ChatTags::default()).is_empty());
    }

    #[test]
    fn test_missing_color_comes_from_palette() {
        let renderer = renderer(RenderOptions::default());
        let msg = renderer.render(&event("hi", ChatTags::default()), String::new());
        assert!(PALETTE.contains(&msg.color.as_str()));
    }

    #[test]
    fn test_hashed_color_is_stable() {
        let renderer = renderer(RenderOptions {
            color_mode: ColorMode::Hashed,
            ..Default::default()
        });
        let first = renderer.render(&event("hi", ChatTags::default()), String::new());
        let second = renderer.render(&event("again", ChatTags::default()), String::new());
        assert_eq!(first.color, second.color);
        assert!(PALETTE.contains(&first.color.as_str()));
    }

    #[test]
    fn test_every_fifth_message_animates() {
        let renderer = renderer(RenderOptions::default());
        let entrances: Vec<_> = (0..10)
            .map(|_| renderer.render(&event("hi", ChatTags::default()), String::new()).entrance)
            .collect();
        for (i, entrance) in entrances.iter().enumerate() {
            assert_eq!(entrance.is_some(), (i + 1) % 5 == 0, "message {}", i + 1);
        }
    }

    #[test]
    fn test_animation_disabled() {
        let renderer = renderer(RenderOptions {
            animation_interval: 0,
            ..Default::default()
        });
        for _ in 0..10 {
            assert!(renderer.render(&event("hi", ChatTags::default()), String::new()).entrance.is_none());
        }
    }

    #[test]
    fn test_is_highlighted() {
        assert!(is_highlighted("wow!"));
        assert!(is_highlighted("LOUD NOISES"));
        assert!(is_highlighted("1234"));
        assert!(!is_highlighted("calm message"));
    }

    #[test]
    fn test_serialized_shape() {
        let renderer = renderer(RenderOptions {
            animation_interval: 1,
            ..Default::default()
        });
        let msg = renderer.render(&event("hi", ChatTags { vip: true, ..Default::default() }), String::new());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["roles"][0], "vip");
        let entrance = json["entrance"].as_str().unwrap();
        assert!(["slideInRight", "bounce-in", "fade-in", "zoom-in"].contains(&entrance));
    }
}
