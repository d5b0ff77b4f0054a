use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Inclusive character span of a native emote inside a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteSpan {
    pub start: usize,
    pub end: usize,
}

impl FromStr for EmoteSpan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("missing '-' in emote span '{}'", s))?;
        let start = start
            .trim()
            .parse()
            .map_err(|_| format!("bad span start in '{}'", s))?;
        let end = end
            .trim()
            .parse()
            .map_err(|_| format!("bad span end in '{}'", s))?;
        Ok(EmoteSpan { start, end })
    }
}

/// Native emote placements keyed by emote id
pub type EmotePlacements = BTreeMap<String, Vec<EmoteSpan>>;

/// Metadata Twitch attaches to every chat line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTags {
    pub display_name: String,
    pub color: Option<String>,
    pub broadcaster: bool,
    pub moderator: bool,
    pub subscriber: bool,
    pub vip: bool,
    pub emotes: Option<EmotePlacements>,
}

impl ChatTags {
    /// Build chat tags from raw IRCv3 tags. `login` is used when the
    /// display name is missing or empty.
    pub fn from_irc_tags(tags: &HashMap<String, String>, login: &str) -> Self {
        let get = |key: &str| tags.get(key).map(String::as_str).unwrap_or("");
        let badges = parse_badges(get("badges"));
        let has_badge = |name: &str| badges.iter().any(|b| b == name);

        let display_name = match get("display-name") {
            "" => login.to_string(),
            name => name.to_string(),
        };

        ChatTags {
            display_name,
            color: non_empty(get("color")),
            broadcaster: has_badge("broadcaster"),
            moderator: get("mod") == "1" || has_badge("moderator"),
            subscriber: get("subscriber") == "1"
                || has_badge("subscriber")
                || has_badge("founder"),
            vip: tags.contains_key("vip") || has_badge("vip"),
            emotes: parse_emotes_tag(get("emotes")),
        }
    }
}

/// A chat message delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageEvent {
    pub channel: String,
    pub login: String,
    pub tags: ChatTags,
    pub text: String,
    pub is_self: bool,
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Badge set names from `broadcaster/1,subscriber/12`
fn parse_badges(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|badge| badge.split('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the `emotes` tag (`25:0-4,6-10/1902:12-16`).
///
/// Returns `None` for an empty tag. Malformed spans are dropped.
pub fn parse_emotes_tag(value: &str) -> Option<EmotePlacements> {
    if value.is_empty() {
        return None;
    }

    let mut placements = EmotePlacements::new();
    for entry in value.split('/') {
        let Some((id, spans)) = entry.split_once(':') else {
            log::debug!("Skipping malformed emote entry: {}", entry);
            continue;
        };
        let spans: Vec<EmoteSpan> = spans
            .split(',')
            .filter_map(|span| match span.parse() {
                Ok(span) => Some(span),
                Err(e) => {
                    log::debug!("Skipping emote span: {}", e);
                    None
                }
            })
            .collect();
        if !spans.is_empty() {
            placements.entry(id.to_string()).or_default().extend(spans);
        }
    }

    if placements.is_empty() {
        None
    } else {
        Some(placements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_emotes_tag() {
        let placements = parse_emotes_tag("25:0-4,12-16/1902:6-10").unwrap();
        assert_eq!(
            placements["25"],
            vec![EmoteSpan { start: 0, end: 4 }, EmoteSpan { start: 12, end: 16 }]
        );
        assert_eq!(placements["1902"], vec![EmoteSpan { start: 6, end: 10 }]);
    }

    #[test]
    fn test_parse_emotes_tag_empty_and_malformed() {
        assert!(parse_emotes_tag("").is_none());
        assert!(parse_emotes_tag("25").is_none());
        assert!(parse_emotes_tag("25:x-4").is_none());
    }

    #[test]
    fn test_roles_from_badges() {
        let raw = tags(&[
            ("badges", "broadcaster/1,subscriber/0"),
            ("display-name", "Streamer"),
            ("color", "#FF0000"),
            ("mod", "0"),
        ]);
        let parsed = ChatTags::from_irc_tags(&raw, "streamer");
        assert!(parsed.broadcaster);
        assert!(parsed.subscriber);
        assert!(!parsed.moderator);
        assert!(!parsed.vip);
        assert_eq!(parsed.display_name, "Streamer");
        assert_eq!(parsed.color.as_deref(), Some("#FF0000"));
    }

    #[test]
    fn test_missing_display_name_and_color() {
        let raw = tags(&[("display-name", ""), ("color", ""), ("mod", "1"), ("vip", "1")]);
        let parsed = ChatTags::from_irc_tags(&raw, "viewer");
        assert_eq!(parsed.display_name, "viewer");
        assert!(parsed.color.is_none());
        assert!(parsed.moderator);
        assert!(parsed.vip);
        assert!(parsed.emotes.is_none());
    }
}
